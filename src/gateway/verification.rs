/// Numbers embedded in `text`, in order. Signs are ignored.
fn extract_numbers(text: &str) -> Vec<f64> {
    let mut numbers = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        let trimmed = current.trim_end_matches('.');
        if let Ok(value) = trimmed.parse::<f64>() {
            numbers.push(value);
        }
        current.clear();
    };

    for c in text.chars() {
        if c.is_ascii_digit() || (c == '.' && !current.is_empty() && !current.contains('.')) {
            current.push(c);
        } else if !current.is_empty() {
            flush(&mut current);
        }
    }
    if !current.is_empty() {
        flush(&mut current);
    }
    numbers
}

/// Answer a verification challenge: the absolute difference of the first two
/// numbers, or their sum when the difference is zero, with two decimals.
pub fn solve_challenge(challenge: &str) -> Option<String> {
    let numbers = extract_numbers(challenge);
    let (a, b) = match numbers.as_slice() {
        [a, b, ..] => (*a, *b),
        _ => return None,
    };
    let diff = (a - b).abs();
    let answer = if diff < f64::EPSILON { a + b } else { diff };
    Some(format!("{answer:.2}"))
}
