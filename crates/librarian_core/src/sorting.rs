//! Sort strings
//!
//! Catalog listings are ordered by a sort string rather than by the raw name, so that "The Hobbit"
//! files under H and authors file under their last name.

/// Leading articles moved to the end of a title
const ARTICLES: [&str; 3] = ["A", "An", "The"];

/// Sort string for an author.
///
/// Required patterns:
/// firstname lastname      ->  lastname, firstname   e.g. Brandon Sanderson
/// (empty) lastname        ->  lastname              e.g. Baosu
/// firstname (empty)       ->  firstname
#[must_use]
#[inline]
pub fn name_sort(first_name: &str, last_name: &str) -> String {
    let first_name = first_name.trim();
    let last_name = last_name.trim();
    match (first_name.is_empty(), last_name.is_empty()) {
        (true, _) => last_name.to_owned(),
        (false, true) => first_name.to_owned(),
        (false, false) => format!("{last_name}, {first_name}"),
    }
}

/// Sort string for a title.
///
/// Required patterns:
/// the everythingelse -> everythingelse, the e.g. The Hobbit
/// a everythingelse -> everythingelse, a e.g. A Game of Thrones
/// an everythingelse -> everythingelse, an e.g. An Echo of Things to Come
#[must_use]
#[inline]
pub fn title_sort(title: &str) -> String {
    let title = title.trim();
    if let Some((prefix, remainder)) = title.split_once(char::is_whitespace) {
        if ARTICLES.contains(&prefix) {
            let trimmed_remainder = remainder.trim();
            if !trimmed_remainder.is_empty() {
                return format!("{trimmed_remainder}, {prefix}");
            }
        }
    }
    title.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_firstname_lastname() {
        let names = [("Brandon", "Sanderson"), ("Robert", "Jordan"), ("Tad", "Williams")];

        let results: Vec<String> = names
            .iter()
            .map(|&(first, last)| name_sort(first, last))
            .collect();

        let expected = vec![
            String::from("Sanderson, Brandon"),
            String::from("Jordan, Robert"),
            String::from("Williams, Tad"),
        ];

        assert_eq!(results, expected);
    }

    #[test]
    fn test_single_names() {
        assert_eq!(name_sort("", "Baosu"), "Baosu");
        assert_eq!(name_sort("Homer", " "), "Homer");
    }

    #[test]
    fn test_titles() {
        let titles = [
            "A Game of Thrones",
            "An Echo of Things to Come",
            "The Hobbit",
            "Neverwhere",
            "I Am Not A Serial Killer",
            "Mr Monster",
            "The Hero of Ages",
            "Theodore Boone",
            "The",
        ];

        let expected = vec![
            String::from("Game of Thrones, A"),
            String::from("Echo of Things to Come, An"),
            String::from("Hobbit, The"),
            String::from("Neverwhere"),
            String::from("I Am Not A Serial Killer"),
            String::from("Mr Monster"),
            String::from("Hero of Ages, The"),
            String::from("Theodore Boone"),
            String::from("The"),
        ];

        let results: Vec<String> = titles.iter().map(|title| title_sort(title)).collect();

        assert_eq!(expected, results);
    }
}
