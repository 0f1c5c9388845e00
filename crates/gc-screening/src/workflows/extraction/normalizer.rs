/// Canonical narrative form every layer works on: invisible characters removed, typographic
/// quotes and dashes folded to ASCII, runs of spaces collapsed. Line breaks are kept because
/// they end clauses.
pub(crate) fn normalize_narrative(value: &str) -> String {
    let cleaned = value
        .replace(['\u{feff}', '\u{200b}', '\u{00ad}'], "")
        .replace(['\u{2018}', '\u{2019}', '\u{2032}'], "'")
        .replace(['\u{201c}', '\u{201d}', '\u{2033}'], "\"")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace('\r', "");

    cleaned
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lookup key for vocabulary and glossary terms.
pub(crate) fn normalize_term(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Lowercased alphanumeric tokens with their byte ranges in `text`.
pub(crate) fn tokenize(text: &str) -> Vec<(String, usize, usize)> {
    let mut tokens = Vec::new();
    let mut start = None;

    for (index, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            if start.is_none() {
                start = Some(index);
            }
        } else if ch == '\'' {
            continue;
        } else if let Some(begin) = start.take() {
            tokens.push((token_text(&text[begin..index]), begin, index));
        }
    }

    if let Some(begin) = start {
        tokens.push((token_text(&text[begin..]), begin, text.len()));
    }

    tokens
}

fn token_text(raw: &str) -> String {
    raw.chars()
        .filter(|ch| *ch != '\'')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Counts written as digits or small English number words.
pub(crate) fn parse_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim().to_ascii_lowercase();
    if let Ok(value) = trimmed.parse::<u32>() {
        return Some(value);
    }

    let value = match trimmed.as_str() {
        "zero" | "none" => 0,
        "one" | "a" | "an" | "single" => 1,
        "two" | "twice" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_narrative_folds_typography_and_whitespace() {
        let source = "\u{feff}G2P2 \u{2013}  2  SVD\r\n\r\n  BMI\u{00a0}22  ";
        assert_eq!(normalize_narrative(source), "G2P2 - 2 SVD\nBMI 22");
    }

    #[test]
    fn tokenize_keeps_byte_offsets() {
        let text = "Crohn's disease, GDM";
        let tokens = tokenize(text);
        let words: Vec<_> = tokens.iter().map(|(word, _, _)| word.as_str()).collect();
        assert_eq!(words, vec!["crohns", "disease", "gdm"]);
        let (_, start, end) = &tokens[2];
        assert_eq!(&text[*start..*end], "GDM");
    }

    #[test]
    fn parse_count_reads_digits_and_words() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("Two"), Some(2));
        assert_eq!(parse_count("several"), None);
    }
}
