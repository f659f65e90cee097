use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed duration string: {0}")]
pub struct MalformedDuration(pub String);

/// A single playable item: stable identity, display metadata, an opaque
/// audio URL and an ISO-8601 period duration (e.g. `PT24H23M7S`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    id: String,
    title: String,
    description: String,
    thumbnail_url: String,
    audio_url: String,
    duration: String,
    is_favorite: bool,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        thumbnail_url: impl Into<String>,
        audio_url: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        let id = id.into();
        debug_assert!(!id.is_empty());
        Self {
            id,
            title: title.into(),
            description: description.into(),
            thumbnail_url: thumbnail_url.into(),
            audio_url: audio_url.into(),
            duration: duration.into(),
            is_favorite: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    pub fn audio_url(&self) -> &str {
        &self.audio_url
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn set_favorite(&mut self, is_favorite: bool) {
        self.is_favorite = is_favorite;
    }

    pub fn duration_in_seconds(&self) -> Result<u64, MalformedDuration> {
        Ok(parse_period(&self.duration)?.total_seconds())
    }

    /// `PT9M15S` renders as `9:15`, `PT24H23M7S` as `24:23:07`: the first
    /// printed unit is unpadded, everything after it is zero-padded.
    pub fn formatted_duration(&self) -> Result<String, MalformedDuration> {
        Ok(format_period(&parse_period(&self.duration)?))
    }

    /// Same width as `formatted_duration`, every digit zeroed.
    pub fn formatted_start_duration(&self) -> Result<String, MalformedDuration> {
        let formatted = self.formatted_duration()?;
        Ok(formatted
            .chars()
            .map(|c| if c.is_ascii_digit() { '0' } else { c })
            .collect())
    }

    /// The last reachable second of the track, e.g. a 15 second track ends
    /// at `14`.
    pub fn formatted_end_duration(&self) -> Result<String, MalformedDuration> {
        let period = parse_period(&self.duration)?.minus_one_second();
        Ok(format_period(&period))
    }

    /// Formats `seconds` and left-pads with a repeating `0`/`:` pattern (a
    /// colon every third inserted character, counting from the right) until
    /// the result is `target_length` wide. Keeps a live position readout the
    /// same width as a fixed end-duration readout.
    pub fn format_seconds(seconds: u64, target_length: usize) -> String {
        let rendered = format_period(&Period::from_seconds(seconds));
        if rendered.len() >= target_length {
            return rendered;
        }
        let mut reversed: String = rendered.chars().rev().collect();
        while reversed.len() < target_length {
            if (reversed.len() + 1) % 3 == 0 {
                reversed.push(':');
            } else {
                reversed.push('0');
            }
        }
        reversed.chars().rev().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Period {
    days: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
}

impl Period {
    fn from_seconds(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: total % 86_400 / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
        }
    }

    fn total_seconds(&self) -> u64 {
        self.days * 86_400 + self.hours * 3_600 + self.minutes * 60 + self.seconds
    }

    // Borrows across fields without re-normalizing the parsed magnitudes,
    // so PT24H23M7S ends at 24:23:06 rather than 1:00:23:06. Clamps at zero.
    fn minus_one_second(&self) -> Self {
        let mut period = *self;
        if period.seconds > 0 {
            period.seconds -= 1;
        } else if period.minutes > 0 {
            period.minutes -= 1;
            period.seconds = 59;
        } else if period.hours > 0 {
            period.hours -= 1;
            period.minutes = 59;
            period.seconds = 59;
        } else if period.days > 0 {
            period.days -= 1;
            period.hours = 23;
            period.minutes = 59;
            period.seconds = 59;
        }
        period
    }
}

/// Accepts the period subset `P[nD][T[nH][nM][nS]]` with components in
/// order and at least one present. Anything else is malformed.
fn parse_period(input: &str) -> Result<Period, MalformedDuration> {
    let malformed = || MalformedDuration(input.to_string());

    let rest = input.strip_prefix('P').ok_or_else(malformed)?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    if time_part == Some("") {
        return Err(malformed());
    }

    let date_fields = parse_fields(date_part, &['D']).map_err(|_| malformed())?;
    let time_fields = match time_part {
        Some(part) => parse_fields(part, &['H', 'M', 'S']).map_err(|_| malformed())?,
        None => vec![None; 3],
    };

    let fields = [date_fields[0], time_fields[0], time_fields[1], time_fields[2]];
    if fields.iter().all(Option::is_none) {
        return Err(malformed());
    }

    Ok(Period {
        days: fields[0].unwrap_or(0),
        hours: fields[1].unwrap_or(0),
        minutes: fields[2].unwrap_or(0),
        seconds: fields[3].unwrap_or(0),
    })
}

fn parse_fields(part: &str, designators: &[char]) -> Result<Vec<Option<u64>>, ()> {
    let mut fields = vec![None; designators.len()];
    let mut next_slot = 0;
    let mut digits = String::new();

    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return Err(());
        }
        let slot = designators.iter().position(|&d| d == c).ok_or(())?;
        if slot < next_slot {
            return Err(());
        }
        fields[slot] = Some(digits.parse().map_err(|_| ())?);
        digits.clear();
        next_slot = slot + 1;
    }
    if !digits.is_empty() {
        return Err(());
    }
    Ok(fields)
}

fn push_unit(out: &mut String, value: u64, separator: &str, include_zeros: bool) -> bool {
    if include_zeros || value > 0 {
        if include_zeros && value < 10 {
            out.push('0');
        }
        out.push_str(&value.to_string());
        out.push_str(separator);
        return true;
    }
    false
}

fn format_period(period: &Period) -> String {
    let mut out = String::new();
    let mut include_zeros = push_unit(&mut out, period.days, ":", false);
    include_zeros = push_unit(&mut out, period.hours, ":", include_zeros);
    include_zeros = push_unit(&mut out, period.minutes, ":", include_zeros);
    push_unit(&mut out, period.seconds, "", include_zeros);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with_duration(duration: &str) -> Track {
        Track::new("t1", "Title", "", "", "file:///tmp/t1.mp3", duration)
    }

    #[test]
    fn parses_full_period() {
        assert_eq!(
            track_with_duration("PT24H23M7S").duration_in_seconds(),
            Ok(87_787)
        );
    }

    #[test]
    fn parses_days() {
        assert_eq!(
            track_with_duration("P2DT1H").duration_in_seconds(),
            Ok(2 * 86_400 + 3_600)
        );
        assert_eq!(track_with_duration("P1D").duration_in_seconds(), Ok(86_400));
    }

    #[test]
    fn parses_partial_periods() {
        assert_eq!(track_with_duration("PT45S").duration_in_seconds(), Ok(45));
        assert_eq!(track_with_duration("PT9M15S").duration_in_seconds(), Ok(555));
        assert_eq!(track_with_duration("PT3M").duration_in_seconds(), Ok(180));
        assert_eq!(track_with_duration("PT0S").duration_in_seconds(), Ok(0));
    }

    #[test]
    fn rejects_malformed_periods() {
        for input in [
            "", "P", "PT", "T1H", "24:23", "PT5", "PT5X", "PT3M2H", "PT1H1H", "P1DT", "pt5s",
            "PT-5S", "PT1.5S", "5S",
        ] {
            assert!(
                track_with_duration(input).duration_in_seconds().is_err(),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn formats_duration() {
        assert_eq!(
            track_with_duration("PT24H23M7S").formatted_duration(),
            Ok("24:23:07".to_string())
        );
        assert_eq!(
            track_with_duration("PT9M15S").formatted_duration(),
            Ok("9:15".to_string())
        );
        assert_eq!(
            track_with_duration("PT10M5S").formatted_duration(),
            Ok("10:05".to_string())
        );
        assert_eq!(
            track_with_duration("PT45S").formatted_duration(),
            Ok("45".to_string())
        );
        assert_eq!(
            track_with_duration("P1DT2H3M4S").formatted_duration(),
            Ok("1:02:03:04".to_string())
        );
    }

    #[test]
    fn formats_start_duration() {
        assert_eq!(
            track_with_duration("PT24H23M7S").formatted_start_duration(),
            Ok("00:00:00".to_string())
        );
        assert_eq!(
            track_with_duration("PT9M15S").formatted_start_duration(),
            Ok("0:00".to_string())
        );
    }

    #[test]
    fn formats_end_duration() {
        assert_eq!(
            track_with_duration("PT24H23M7S").formatted_end_duration(),
            Ok("24:23:06".to_string())
        );
        assert_eq!(
            track_with_duration("PT15S").formatted_end_duration(),
            Ok("14".to_string())
        );
        assert_eq!(
            track_with_duration("PT10M").formatted_end_duration(),
            Ok("9:59".to_string())
        );
        assert_eq!(
            track_with_duration("PT1H").formatted_end_duration(),
            Ok("59:59".to_string())
        );
        assert_eq!(
            track_with_duration("PT0S").formatted_end_duration(),
            Ok(String::new())
        );
    }

    #[test]
    fn formats_seconds_with_padding() {
        assert_eq!(Track::format_seconds(23_461, 8), "06:31:01");
        assert_eq!(Track::format_seconds(23_461, 0), "6:31:01");
        assert_eq!(Track::format_seconds(3_605, 7), "1:00:05");
        assert_eq!(Track::format_seconds(5, 5), "00:05");
        assert_eq!(Track::format_seconds(5, 8), "00:00:05");
        assert_eq!(Track::format_seconds(65, 0), "1:05");
    }

    #[test]
    fn position_readout_keeps_end_duration_width() {
        for duration in ["PT6H31M1S", "PT9M15S", "PT45S", "PT1H2M3S"] {
            let track = track_with_duration(duration);
            let total = track.duration_in_seconds().unwrap();
            let end = track.formatted_end_duration().unwrap();
            for position in [0, 1, total / 2, total - 1] {
                let rendered = Track::format_seconds(position, end.len());
                assert_eq!(rendered.len(), end.len(), "duration {duration} at {position}");
            }
        }
    }

    #[test]
    fn favorite_flag_participates_in_equality() {
        let a = track_with_duration("PT45S");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.set_favorite(true);
        assert_ne!(a, b);
        assert!(b.is_favorite());
    }
}
