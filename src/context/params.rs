use std::ops::Deref;
use std::str::FromStr;

use smallvec::SmallVec;

/// Path parameters captured by a matched route.
#[derive(Debug, Default, Clone)]
pub struct Params {
    buf: SmallVec<[(Box<str>, String); 4]>,
    tail: Option<String>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.buf
            .iter()
            .find_map(|(k, v)| if **k == *name { Some(v.as_str()) } else { None })
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.get(name).map(T::from_str)
    }

    /// The part of the path matched by a trailing wildcard, without a leading
    /// slash. `Some("")` when the wildcard matched nothing.
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.buf.iter().map(|(k, v)| (&**k, v.as_str()))
    }
}

impl Deref for Params {
    type Target = [(Box<str>, String)];
    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl Params {
    pub(crate) fn push(&mut self, name: &str, value: &str) {
        self.buf.push((name.into(), value.to_owned()))
    }

    pub(crate) fn set_tail(&mut self, parts: &[&str]) {
        self.tail = Some(parts.join("/"));
    }
}
