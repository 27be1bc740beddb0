// Letter grades and grade points

/// Grade points for the letters the course average understands
const GRADE_POINTS: [(&str, f64); 4] = [("A", 4.0), ("A-", 3.7), ("B+", 3.3), ("B", 3.0)];

/// Points for a letter grade; anything outside the table weighs 0
pub fn grade_points(letter: &str) -> f64 {
    GRADE_POINTS
        .iter()
        .find(|(grade, _)| *grade == letter)
        .map(|(_, points)| *points)
        .unwrap_or(0.0)
}

/// Mean of the grade points, rendered with two decimals
///
/// Unknown letters still count toward the denominator, so they pull the
/// average down instead of being skipped. Returns None for no grades.
pub fn average<'a, I>(letters: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let (sum, count) = letters
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), letter| {
            (sum + grade_points(letter), count + 1)
        });

    if count == 0 {
        return None;
    }
    Some(to_fixed_2(sum / count as f64))
}

/// Two-decimal rendering where an exact tie rounds up (1.125 -> "1.13")
///
/// `format!("{:.2}")` breaks exact ties toward even, so the rounding is done
/// on the exact decimal expansion instead. Grade averages are never negative.
fn to_fixed_2(value: f64) -> String {
    // Averages lie in [0, 4], so their exact expansion fits in 60 places
    let exact = format!("{:.60}", value);
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let digits = fraction.as_bytes();
    let digit = |i: usize| digits.get(i).map_or(0, |d| u64::from(d - b'0'));

    let whole: u64 = whole.parse().unwrap_or(0);
    let mut hundredths = whole * 100 + digit(0) * 10 + digit(1);
    if digit(2) >= 5 {
        hundredths += 1;
    }

    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}
