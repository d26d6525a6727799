//! A suffix-stripping stemmer for Pāli nominal declensions.
//!
//! Endings are tried longest first and at most one is removed. Optative
//! forms in `-eyya` are left alone, since their final `a` is part of the
//! verb ending rather than a case ending.

use tantivy::tokenizer::{Token, TokenFilter, TokenStream, Tokenizer};

/// Case endings, longest first.
const ENDINGS: &[&str] = &[
    "asmiṁ", "ānaṁ", "īnaṁ", "ūnaṁ", "ebhi", "amhi", "assa", "smiṁ", "āyaṁ",
    "ehi", "esu", "āya", "ena", "ato", "ssa", "mhi", "āni", "āhi", "āsu",
    "īhi", "ūhi", "isu", "īsu", "ūsu", "iyo", "ayo", "avo", "ino", "inā",
    "unā", "uno", "aṁ", "iṁ", "uṁ", "ā", "a", "o", "e", "i", "ī", "u", "ū",
];

/// Endings which mark a form that isn't declined.
const PROTECTED_ENDINGS: &[&str] = &["eyya", "eyyaṁ", "eyyuṁ"];

/// Shortest stem left after removing an ending.
const MIN_STEM_CHARS: usize = 2;

/// Stem a single lowercase Pāli word. Returns the word unchanged when no
/// ending applies.
pub fn pali_stem(word: &str) -> String {
    let word = word.replace('ṃ', "ṁ");

    if PROTECTED_ENDINGS.iter().any(|e| word.ends_with(e)) {
        return word;
    }

    let char_count = word.chars().count();

    for ending in ENDINGS {
        if let Some(stem) = word.strip_suffix(ending)
            && char_count - ending.chars().count() >= MIN_STEM_CHARS
        {
            return stem.to_string();
        }
    }

    word
}

/// Token filter applying [`pali_stem`] to each token.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaliStemmer;

impl TokenFilter for PaliStemmer {
    type Tokenizer<T: Tokenizer> = PaliStemFilter<T>;

    fn transform<T: Tokenizer>(self, tokenizer: T) -> Self::Tokenizer<T> {
        PaliStemFilter { inner: tokenizer }
    }
}

#[derive(Clone)]
pub struct PaliStemFilter<T> {
    inner: T,
}

impl<T: Tokenizer> Tokenizer for PaliStemFilter<T> {
    type TokenStream<'a> = PaliStemTokenStream<T::TokenStream<'a>>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        PaliStemTokenStream {
            tail: self.inner.token_stream(text),
        }
    }
}

pub struct PaliStemTokenStream<T> {
    tail: T,
}

impl<T: TokenStream> TokenStream for PaliStemTokenStream<T> {
    fn advance(&mut self) -> bool {
        if !self.tail.advance() {
            return false;
        }

        let token = self.tail.token_mut();
        let stem = pali_stem(&token.text);
        if !stem.is_empty() {
            token.text = stem;
        }

        true
    }

    fn token(&self) -> &Token {
        self.tail.token()
    }

    fn token_mut(&mut self) -> &mut Token {
        self.tail.token_mut()
    }
}
