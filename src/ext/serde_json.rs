// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dotted-path lookup on serde_json::Value that tells "missing" apart from "present but null"
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper for typed extraction
// invariants: No panics; missing paths yield None / is_present() == false
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;

/// Wrapper around a JSON location to allow typed extraction via a clear second step.
pub struct JsonFetched<'a> {
  inner: Option<&'a serde_json::Value>,
}

impl<'a> JsonFetched<'a> {
  /// True when the path resolved, even if the value there is `null`.
  pub fn is_present(&self) -> bool {
    self.inner.is_some()
  }

  pub fn is_null(&self) -> bool {
    matches!(self.inner, Some(serde_json::Value::Null))
  }

  /// Attempt to deserialize the fetched value as `T`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.inner.and_then(|v| T::deserialize(v).ok())
  }

  pub fn as_array(&self) -> Option<&'a Vec<serde_json::Value>> {
    self.inner.and_then(|v| v.as_array())
  }
}

/// Extension to fetch nested values via dotted paths like "builds.0.number".
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for serde_json::Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      let next = match cur {
        serde_json::Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => cur.get(key),
      };
      match next {
        Some(n) => cur = n,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
