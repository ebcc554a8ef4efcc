//! Canonical book tables: ordered book ids and chapter counts per testament.
//!
//! Book ids follow the lowercase USFM convention used by the source
//! resource layout (`mat`, `mrk`, ... with one directory per book and one
//! JSON file per chapter).

use crate::error::{Error, Result};
use crate::types::Testament;

/// One canonical book: id, chapter count, testament.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookInfo {
    pub id: &'static str,
    pub chapters: u32,
    pub testament: Testament,
}

const OT: Testament = Testament::Old;
const NT: Testament = Testament::New;

#[rustfmt::skip]
const BOOKS: &[BookInfo] = &[
    BookInfo { id: "gen", chapters: 50, testament: OT },
    BookInfo { id: "exo", chapters: 40, testament: OT },
    BookInfo { id: "lev", chapters: 27, testament: OT },
    BookInfo { id: "num", chapters: 36, testament: OT },
    BookInfo { id: "deu", chapters: 34, testament: OT },
    BookInfo { id: "jos", chapters: 24, testament: OT },
    BookInfo { id: "jdg", chapters: 21, testament: OT },
    BookInfo { id: "rut", chapters: 4,  testament: OT },
    BookInfo { id: "1sa", chapters: 31, testament: OT },
    BookInfo { id: "2sa", chapters: 24, testament: OT },
    BookInfo { id: "1ki", chapters: 22, testament: OT },
    BookInfo { id: "2ki", chapters: 25, testament: OT },
    BookInfo { id: "1ch", chapters: 29, testament: OT },
    BookInfo { id: "2ch", chapters: 36, testament: OT },
    BookInfo { id: "ezr", chapters: 10, testament: OT },
    BookInfo { id: "neh", chapters: 13, testament: OT },
    BookInfo { id: "est", chapters: 10, testament: OT },
    BookInfo { id: "job", chapters: 42, testament: OT },
    BookInfo { id: "psa", chapters: 150, testament: OT },
    BookInfo { id: "pro", chapters: 31, testament: OT },
    BookInfo { id: "ecc", chapters: 12, testament: OT },
    BookInfo { id: "sng", chapters: 8,  testament: OT },
    BookInfo { id: "isa", chapters: 66, testament: OT },
    BookInfo { id: "jer", chapters: 52, testament: OT },
    BookInfo { id: "lam", chapters: 5,  testament: OT },
    BookInfo { id: "ezk", chapters: 48, testament: OT },
    BookInfo { id: "dan", chapters: 12, testament: OT },
    BookInfo { id: "hos", chapters: 14, testament: OT },
    BookInfo { id: "jol", chapters: 3,  testament: OT },
    BookInfo { id: "amo", chapters: 9,  testament: OT },
    BookInfo { id: "oba", chapters: 1,  testament: OT },
    BookInfo { id: "jon", chapters: 4,  testament: OT },
    BookInfo { id: "mic", chapters: 7,  testament: OT },
    BookInfo { id: "nam", chapters: 3,  testament: OT },
    BookInfo { id: "hab", chapters: 3,  testament: OT },
    BookInfo { id: "zep", chapters: 3,  testament: OT },
    BookInfo { id: "hag", chapters: 2,  testament: OT },
    BookInfo { id: "zec", chapters: 14, testament: OT },
    BookInfo { id: "mal", chapters: 4,  testament: OT },
    BookInfo { id: "mat", chapters: 28, testament: NT },
    BookInfo { id: "mrk", chapters: 16, testament: NT },
    BookInfo { id: "luk", chapters: 24, testament: NT },
    BookInfo { id: "jhn", chapters: 21, testament: NT },
    BookInfo { id: "act", chapters: 28, testament: NT },
    BookInfo { id: "rom", chapters: 16, testament: NT },
    BookInfo { id: "1co", chapters: 16, testament: NT },
    BookInfo { id: "2co", chapters: 13, testament: NT },
    BookInfo { id: "gal", chapters: 6,  testament: NT },
    BookInfo { id: "eph", chapters: 6,  testament: NT },
    BookInfo { id: "php", chapters: 4,  testament: NT },
    BookInfo { id: "col", chapters: 4,  testament: NT },
    BookInfo { id: "1th", chapters: 5,  testament: NT },
    BookInfo { id: "2th", chapters: 3,  testament: NT },
    BookInfo { id: "1ti", chapters: 6,  testament: NT },
    BookInfo { id: "2ti", chapters: 4,  testament: NT },
    BookInfo { id: "tit", chapters: 3,  testament: NT },
    BookInfo { id: "phm", chapters: 1,  testament: NT },
    BookInfo { id: "heb", chapters: 13, testament: NT },
    BookInfo { id: "jas", chapters: 5,  testament: NT },
    BookInfo { id: "1pe", chapters: 5,  testament: NT },
    BookInfo { id: "2pe", chapters: 3,  testament: NT },
    BookInfo { id: "1jn", chapters: 5,  testament: NT },
    BookInfo { id: "2jn", chapters: 1,  testament: NT },
    BookInfo { id: "3jn", chapters: 1,  testament: NT },
    BookInfo { id: "jud", chapters: 1,  testament: NT },
    BookInfo { id: "rev", chapters: 22, testament: NT },
];

/// Ordered canonical book list for a testament.
pub fn books(testament: Testament) -> impl Iterator<Item = &'static BookInfo> {
    BOOKS.iter().filter(move |b| b.testament == testament)
}

/// Look up one book by id.
pub fn book(book_id: &str) -> Option<&'static BookInfo> {
    BOOKS.iter().find(|b| b.id == book_id)
}

/// Chapter labels for a book, in reading order ("1", "2", ...).
pub fn chapters(book_id: &str) -> Result<Vec<String>> {
    let info = book(book_id).ok_or_else(|| Error::UnknownBook(book_id.to_string()))?;
    Ok((1..=info.chapters).map(|c| c.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testament_sizes() {
        assert_eq!(books(Testament::New).count(), 27);
        assert_eq!(books(Testament::Old).count(), 39);
    }

    #[test]
    fn test_nt_starts_with_matthew() {
        let first = books(Testament::New).next().unwrap();
        assert_eq!(first.id, "mat");
        assert_eq!(first.chapters, 28);
    }

    #[test]
    fn test_chapters_for_titus() {
        let chs = chapters("tit").unwrap();
        assert_eq!(chs, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unknown_book_rejected() {
        assert!(chapters("xyz").is_err());
    }
}
