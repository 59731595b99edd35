// ============================================================
// Layer 2 — QueryUseCase
// ============================================================
// Searches the blob store and pulls permanode titles out of
// the described results.
//
// A search response looks like this (trimmed):
//
//   {
//     "blobs": [ { "blob": "sha224-aaa" }, ... ],
//     "description": {
//       "meta": {
//         "sha224-aaa": {
//           "permanode": { "attr": { "title": ["Solln 2018"] } }
//         }
//       }
//     }
//   }
//
// Blobs without a title attribute are skipped.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::traits::BlobStore;

/// A permanode and its first title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitledBlob {
    pub blob:  String,
    pub title: String,
}

pub struct QueryUseCase<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> QueryUseCase<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Pass a raw query body straight through to the store.
    pub fn run(&self, opts: &Value) -> Result<Value> {
        self.store.query(opts)
    }

    /// Search for `expression` and return the titles of matching
    /// permanodes, in result order.
    pub fn titles(&self, expression: &str, describe_depth: u32) -> Result<Vec<TitledBlob>> {
        tracing::info!("Querying '{}'", expression);
        let results = self.store.query(&build_query(expression, describe_depth))?;

        let titles = extract_titles(&results);
        tracing::info!("{} titled blobs found", titles.len());
        Ok(titles)
    }
}

/// Search body that also describes each hit's camliContent.
pub fn build_query(expression: &str, describe_depth: u32) -> Value {
    json!({
        "expression": expression,
        "describe": {
            "depth": describe_depth,
            "rules": [
                { "attrs": ["camliContent"] },
            ],
        },
    })
}

pub fn extract_titles(results: &Value) -> Vec<TitledBlob> {
    let Some(blobs) = results["blobs"].as_array() else {
        return Vec::new();
    };

    blobs
        .iter()
        .filter_map(|b| b["blob"].as_str())
        .filter_map(|blob| {
            let title = results["description"]["meta"][blob]["permanode"]["attr"]["title"][0].as_str()?;
            Some(TitledBlob { blob: blob.to_string(), title: title.to_string() })
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Answers every query with a canned response and records the bodies
    struct CannedStore {
        response: Value,
        seen:     RefCell<Vec<Value>>,
    }

    impl BlobStore for CannedStore {
        fn query(&self, opts: &Value) -> Result<Value> {
            self.seen.borrow_mut().push(opts.clone());
            Ok(self.response.clone())
        }

        fn download(&self, _blobref: &str) -> Result<Vec<u8>> {
            unimplemented!()
        }

        fn upload(&self, _blob: Vec<u8>, _file_name: &str) -> Result<String> {
            unimplemented!()
        }
    }

    fn store(response: Value) -> CannedStore {
        CannedStore { response, seen: RefCell::new(Vec::new()) }
    }

    #[test]
    fn test_query_body_describes_content() {
        let q = build_query("tag:solln", 1);
        assert_eq!(q["expression"], "tag:solln");
        assert_eq!(q["describe"]["depth"], 1);
        assert_eq!(q["describe"]["rules"][0]["attrs"][0], "camliContent");
    }

    #[test]
    fn test_titles_skip_untitled_blobs() {
        let response = json!({
            "blobs": [{"blob": "sha224-a"}, {"blob": "sha224-b"}, {"blob": "sha224-c"}],
            "description": {"meta": {
                "sha224-a": {"permanode": {"attr": {"title": ["First"]}}},
                "sha224-b": {"permanode": {"attr": {}}},
                "sha224-c": {"permanode": {"attr": {"title": ["Third", "ignored"]}}}
            }}
        });

        let use_case = QueryUseCase::new(store(response));
        let titles   = use_case.titles("tag:solln", 1).unwrap();

        assert_eq!(titles, vec![
            TitledBlob { blob: "sha224-a".into(), title: "First".into() },
            TitledBlob { blob: "sha224-c".into(), title: "Third".into() },
        ]);
        assert_eq!(use_case.store.seen.borrow()[0]["expression"], "tag:solln");
    }

    #[test]
    fn test_no_blobs_gives_no_titles() {
        assert!(extract_titles(&json!({})).is_empty());
        assert!(extract_titles(&json!({"blobs": null})).is_empty());
    }

    #[test]
    fn test_run_passes_body_through() {
        let use_case = QueryUseCase::new(store(json!({"ok": true})));
        let result   = use_case.run(&json!({"expression": "is:image"})).unwrap();
        assert_eq!(result["ok"], true);
        assert_eq!(use_case.store.seen.borrow()[0], json!({"expression": "is:image"}));
    }
}
