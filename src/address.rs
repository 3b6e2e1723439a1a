use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use tokio::sync::watch;

/// Characters that would break the `key=value&key=value` layout of the fragment.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?');

const SEARCH_KEY: &str = "q";
const MOVIE_KEY: &str = "id";

/// The two fields the navigation address carries.
///
/// An empty `selected_movie_id` is the one and only "no detail overlay" signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressQuery {
    pub search_word: String,
    pub selected_movie_id: String,
}

impl AddressQuery {
    /// Parse a fragment such as `#?q=matrix&id=603`.
    ///
    /// Never fails: unknown keys are ignored, missing fields stay empty, and for
    /// repeated keys the last one wins.
    pub fn parse(fragment: &str) -> Self {
        let query = fragment.trim_start_matches('#').trim_start_matches('?');
        let mut parsed = Self::default();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode(value);
            match key {
                SEARCH_KEY => parsed.search_word = value,
                MOVIE_KEY => parsed.selected_movie_id = value,
                _ => {}
            }
        }
        parsed
    }

    /// Inverse of [`AddressQuery::parse`]; empty fields are omitted entirely.
    pub fn to_fragment(&self) -> String {
        let mut pairs = Vec::with_capacity(2);
        if !self.search_word.is_empty() {
            pairs.push(format!("{SEARCH_KEY}={}", encode(&self.search_word)));
        }
        if !self.selected_movie_id.is_empty() {
            pairs.push(format!("{MOVIE_KEY}={}", encode(&self.selected_movie_id)));
        }
        if pairs.is_empty() {
            "#".to_string()
        } else {
            format!("#?{}", pairs.join("&"))
        }
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_movie_id.is_empty()
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

fn decode(value: &str) -> String {
    percent_decode_str(&value.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// Owner of the navigation address.
///
/// All writes replace the whole query in one step and are visible to the next
/// [`AddressState::read`] immediately. Observers hold a [`watch::Receiver`] and
/// are only woken when the query actually changed.
pub struct AddressState {
    tx: watch::Sender<AddressQuery>,
}

impl AddressState {
    pub fn new() -> Self {
        Self::with_query(AddressQuery::default())
    }

    /// Seed from a deep link.
    pub fn from_fragment(fragment: &str) -> Self {
        Self::with_query(AddressQuery::parse(fragment))
    }

    fn with_query(query: AddressQuery) -> Self {
        let (tx, _rx) = watch::channel(query);
        Self { tx }
    }

    pub fn read(&self) -> AddressQuery {
        self.tx.borrow().clone()
    }

    pub fn fragment(&self) -> String {
        self.tx.borrow().to_fragment()
    }

    pub fn subscribe(&self) -> watch::Receiver<AddressQuery> {
        self.tx.subscribe()
    }

    /// Point the address at `movie_id`, keeping the search word. An empty id
    /// clears the selection instead.
    pub fn select_movie(&self, movie_id: &str) {
        if movie_id.is_empty() {
            self.clear_selection();
            return;
        }
        let next = AddressQuery {
            selected_movie_id: movie_id.to_string(),
            ..self.read()
        };
        self.replace(next);
    }

    /// Drop the `id` field, keeping the search word.
    pub fn clear_selection(&self) {
        let next = AddressQuery {
            selected_movie_id: String::new(),
            ..self.read()
        };
        self.replace(next);
    }

    pub fn set_search_word(&self, word: &str) {
        let next = AddressQuery {
            search_word: word.to_string(),
            ..self.read()
        };
        self.replace(next);
    }

    fn replace(&self, next: AddressQuery) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::debug!(address = %self.fragment(), "address changed");
        }
    }
}

impl Default for AddressState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_fragment() {
        let q = AddressQuery::parse("#?q=matrix&id=603");
        assert_eq!(q.search_word, "matrix");
        assert_eq!(q.selected_movie_id, "603");
    }

    #[test]
    fn test_parse_missing_fields_default_to_empty() {
        assert_eq!(AddressQuery::parse(""), AddressQuery::default());
        assert_eq!(AddressQuery::parse("#"), AddressQuery::default());
        let q = AddressQuery::parse("q=alien");
        assert_eq!(q.search_word, "alien");
        assert_eq!(q.selected_movie_id, "");
    }

    #[test]
    fn test_parse_malformed_input_never_fails() {
        let q = AddressQuery::parse("#?&&=&q&id=%zz&foo=bar");
        assert_eq!(q.search_word, "");
        assert_eq!(q.selected_movie_id, "%zz");
    }

    #[test]
    fn test_fragment_encoding_survives_reserved_characters() {
        let q = AddressQuery {
            search_word: "tom & jerry = 100%".to_string(),
            selected_movie_id: "42".to_string(),
        };
        let fragment = q.to_fragment();
        assert!(fragment.starts_with("#?q="));
        assert_eq!(AddressQuery::parse(&fragment), q);
    }

    #[test]
    fn test_fragment_omits_empty_fields() {
        assert_eq!(AddressQuery::default().to_fragment(), "#");
        let q = AddressQuery {
            search_word: String::new(),
            selected_movie_id: "7".to_string(),
        };
        assert_eq!(q.to_fragment(), "#?id=7");
    }

    #[test]
    fn test_select_and_clear_keep_search_word() {
        let address = AddressState::from_fragment("#?q=matrix");

        address.select_movie("42");
        let q = address.read();
        assert_eq!(q.selected_movie_id, "42");
        assert_eq!(q.search_word, "matrix");

        address.clear_selection();
        let q = address.read();
        assert_eq!(q.selected_movie_id, "");
        assert_eq!(q.search_word, "matrix");
        assert_eq!(address.fragment(), "#?q=matrix");
    }

    #[test]
    fn test_select_empty_id_clears() {
        let address = AddressState::from_fragment("#?id=5");
        address.select_movie("");
        assert!(!address.read().has_selection());
    }

    #[test]
    fn test_set_search_word_keeps_selection() {
        let address = AddressState::from_fragment("#?id=5");
        address.set_search_word("dune");
        assert_eq!(address.fragment(), "#?q=dune&id=5");
    }

    #[test]
    fn test_observers_only_notified_on_real_change() {
        let address = AddressState::new();
        let mut rx = address.subscribe();

        address.clear_selection();
        assert!(!rx.has_changed().unwrap());

        address.select_movie("1");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().selected_movie_id, "1");

        address.select_movie("1");
        assert!(!rx.has_changed().unwrap());
    }
}
