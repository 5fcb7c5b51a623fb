//! Title shaping for message blocks: line wrapping and abbreviation.

/// Hard character limit of a single title line.
const MAX_CHARS_PER_LINE: usize = 22;

const ABBREVIATIONS: [(&str, &str); 6] = [
    ("Bonehead Move!", "Bonehead!"),
    ("Trash Nose Grab", "Trash N.G."),
    ("Robo Nose Grab", "Robo N.G."),
    ("Caution!", "Caution!"),
    ("Trash Nose Grab x Trash Nose Grab", "Trash N.G. x2"),
    ("Robo Nose Grab x Robo Nose Grab", "Robo N.G. x2"),
];

fn is_break_point(c: char) -> bool {
    matches!(c, ' ' | '+' | '!' | '–' | ':')
}

fn collect_trimmed(chars: &[char]) -> String {
    chars.iter().collect::<String>().trim().to_owned()
}

/// Splits a title into at most two lines of at most 22 characters.
///
/// Prefers the last natural break point within the limit and falls back to a
/// hard break, truncating whatever does not fit on the second line.
pub(crate) fn wrap_title(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_CHARS_PER_LINE {
        return vec![text.to_owned()];
    }

    let search_from = MAX_CHARS_PER_LINE.min(chars.len() - 1);
    let natural_break = (1..=search_from).rev().find(|&index| is_break_point(chars[index]));

    if let Some(index) = natural_break {
        let first = collect_trimmed(&chars[..index]);
        let second = collect_trimmed(&chars[index..]);
        if first.chars().count() <= MAX_CHARS_PER_LINE
            && second.chars().count() <= MAX_CHARS_PER_LINE
        {
            return vec![first, second];
        }
    }

    let first = collect_trimmed(&chars[..MAX_CHARS_PER_LINE]);
    let rest: Vec<char> = collect_trimmed(&chars[MAX_CHARS_PER_LINE..]).chars().collect();
    let second = if rest.len() > MAX_CHARS_PER_LINE {
        collect_trimmed(&rest[..MAX_CHARS_PER_LINE])
    } else {
        rest.into_iter().collect()
    };
    vec![first, second]
}

/// Shortens well-known trick names.
pub(crate) fn abbreviate(text: &str) -> String {
    if let Some((_, short)) = ABBREVIATIONS.iter().find(|(long, _)| *long == text) {
        return (*short).to_owned();
    }

    if text.contains(" Nose Grab") {
        return text.replacen(" Nose Grab", " N.G.", 1);
    }
    if text.contains(" Move!") {
        return text.replacen(" Move!", "!", 1);
    }

    text.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_stay_on_one_line() {
        assert_eq!(wrap_title("Trash Nose Grab"), vec!["Trash Nose Grab"]);
    }

    #[test]
    fn long_titles_break_at_the_last_separator() {
        assert_eq!(
            wrap_title("Trash Nose Grab x Trash Nose Grab"),
            vec!["Trash Nose Grab x", "Trash Nose Grab"]
        );
    }

    #[test]
    fn titles_without_separators_are_hard_broken_and_truncated() {
        let title = "A".repeat(50);
        let lines = wrap_title(&title);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 22);
        assert_eq!(lines[1].len(), 22);
    }

    #[test]
    fn abbreviations_prefer_the_dictionary() {
        assert_eq!(abbreviate("Robo Nose Grab x Robo Nose Grab"), "Robo N.G. x2");
        assert_eq!(abbreviate("Cone Nose Grab +2"), "Cone N.G. +2");
        assert_eq!(abbreviate("Bonehead Move! +3"), "Bonehead! +3");
        assert_eq!(abbreviate("COMBO!"), "COMBO!");
    }
}
