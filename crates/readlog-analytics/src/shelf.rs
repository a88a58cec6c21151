use std::collections::HashMap;

use readlog_common::{BookStatus, UserBook};

/// A user's books split by status, each group newest first.
#[derive(Debug, Clone, Default)]
pub struct ShelfGroups {
    groups: HashMap<BookStatus, Vec<UserBook>>,
}

impl ShelfGroups {
    pub fn get(&self, status: BookStatus) -> &[UserBook] {
        self.groups.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups in shelf order, empty groups included.
    pub fn iter(&self) -> impl Iterator<Item = (BookStatus, &[UserBook])> + '_ {
        BookStatus::ALL.into_iter().map(move |status| (status, self.get(status)))
    }

    pub fn total(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Read books are ordered by finish date (falling back to the date added);
/// every other group by the date added.
pub fn group_by_status(books: impl IntoIterator<Item = UserBook>) -> ShelfGroups {
    let mut groups: HashMap<BookStatus, Vec<UserBook>> = HashMap::new();
    for book in books {
        groups.entry(book.status).or_default().push(book);
    }

    for (status, books) in groups.iter_mut() {
        if *status == BookStatus::Read {
            books.sort_by(|a, b| {
                let a_date = a.date_finished.unwrap_or(a.date_added);
                let b_date = b.date_finished.unwrap_or(b.date_added);
                b_date.cmp(&a_date)
            });
        } else {
            books.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        }
    }

    ShelfGroups { groups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn book(isbn: &str, status: BookStatus, added: &str, finished: Option<&str>) -> UserBook {
        UserBook {
            user_id: "reader".to_string(),
            isbn: isbn.to_string(),
            title: isbn.to_uppercase(),
            authors: Vec::new(),
            pages: None,
            status,
            current_page: None,
            user_rating: None,
            date_added: ts(added),
            date_updated: ts(added),
            date_finished: finished.map(ts),
        }
    }

    #[test]
    fn test_read_books_sorted_by_finish_date() {
        let shelf = group_by_status(vec![
            book("a", BookStatus::Read, "2024-01-01T00:00:00Z", Some("2024-01-05T00:00:00Z")),
            book("b", BookStatus::Read, "2024-01-02T00:00:00Z", Some("2024-03-01T00:00:00Z")),
            book("c", BookStatus::Read, "2024-02-01T00:00:00Z", None),
        ]);

        let order: Vec<&str> =
            shelf.get(BookStatus::Read).iter().map(|b| b.isbn.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_other_groups_sorted_by_date_added() {
        let shelf = group_by_status(vec![
            book("old", BookStatus::WantToRead, "2023-05-01T00:00:00Z", None),
            book("new", BookStatus::WantToRead, "2024-05-01T00:00:00Z", None),
            book("now", BookStatus::CurrentlyReading, "2024-06-01T00:00:00Z", None),
        ]);

        let order: Vec<&str> =
            shelf.get(BookStatus::WantToRead).iter().map(|b| b.isbn.as_str()).collect();
        assert_eq!(order, vec!["new", "old"]);
        assert_eq!(shelf.get(BookStatus::CurrentlyReading).len(), 1);
        assert!(shelf.get(BookStatus::DidNotFinish).is_empty());
        assert_eq!(shelf.total(), 3);
    }

    #[test]
    fn test_iter_yields_every_status_in_order() {
        let shelf = group_by_status(Vec::new());
        let statuses: Vec<BookStatus> = shelf.iter().map(|(s, _)| s).collect();
        assert_eq!(statuses, BookStatus::ALL.to_vec());
    }
}
