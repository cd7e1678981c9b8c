//! Search construction
//!
//! A search starts either from a full parameter mapping ([`FhirSearch`]) or
//! from a chain of single terms ([`SearchElement`]) that the caller extends
//! one parameter at a time. Nothing here performs I/O except
//! [`FhirSearch::perform`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::bundle::Bundle;
use crate::error::Result;
use crate::resource::FhirResource;
use crate::server::FhirServer;

/// Search parameter mapping, in insertion order
pub type SearchParams = Map<String, JsonValue>;

/// A finalized search: a resource type plus its parameter mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FhirSearch {
    pub resource_name: String,
    pub params: SearchParams,
}

impl FhirSearch {
    pub fn new(resource_name: impl Into<String>, params: SearchParams) -> Self {
        Self {
            resource_name: resource_name.into(),
            params,
        }
    }

    /// Build the relative query path, e.g. `Patient?name=smith&gender=male`.
    ///
    /// Arrays repeat the parameter, objects turn each key into a modifier
    /// (`{"name": {"$exact": "x"}}` becomes `name:exact=x`) and nulls are
    /// dropped.
    pub fn construct(&self) -> String {
        let mut pairs = Vec::new();
        for (key, value) in &self.params {
            push_param(&mut pairs, key, value);
        }

        if pairs.is_empty() {
            self.resource_name.clone()
        } else {
            format!("{}?{}", self.resource_name, pairs.join("&"))
        }
    }

    /// Run the search against a server and parse the first result page.
    pub fn perform<S: FhirServer + ?Sized>(&self, server: &S) -> Result<Bundle> {
        let path = self.construct();
        tracing::debug!(%path, "Performing search");
        let json = server.request_json(&path)?;
        Ok(serde_json::from_value(json)?)
    }
}

fn push_param(pairs: &mut Vec<String>, key: &str, value: &JsonValue) {
    match value {
        JsonValue::Null => {}
        JsonValue::String(s) => pairs.push(format!("{}={}", key, urlencoding::encode(s))),
        JsonValue::Number(n) => pairs.push(format!("{}={}", key, n)),
        JsonValue::Bool(b) => pairs.push(format!("{}={}", key, b)),
        JsonValue::Array(items) => {
            for item in items {
                push_param(pairs, key, item);
            }
        }
        JsonValue::Object(modifiers) => {
            for (modifier, inner) in modifiers {
                let modifier = modifier.trim_start_matches('$');
                push_param(pairs, &format!("{}:{}", key, modifier), inner);
            }
        }
    }
}

/// One term of a search chain.
///
/// A root node has no subject; it only fixes the resource type. Each call to
/// [`SearchElement::and`] pushes the current node into `previous` and starts a
/// new term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Box<SearchElement>>,
}

impl SearchElement {
    /// Empty chain start with no parameter bound yet
    pub fn root(resource_type: impl Into<String>) -> Self {
        Self {
            subject: None,
            reference: None,
            resource_type: resource_type.into(),
            previous: None,
        }
    }

    pub fn new(subject: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::root(resource_type)
        }
    }

    /// Set the value this term matches against
    pub fn with_reference(mut self, value: impl Into<String>) -> Self {
        self.reference = Some(value.into());
        self
    }

    /// Append a new term for `subject`, keeping this one as its predecessor.
    pub fn and(self, subject: impl Into<String>) -> Self {
        let resource_type = self.resource_type.clone();
        Self {
            subject: Some(subject.into()),
            reference: None,
            resource_type,
            previous: Some(Box::new(self)),
        }
    }

    pub fn is_root(&self) -> bool {
        self.subject.is_none() && self.previous.is_none()
    }

    /// Terms of the chain, oldest first
    pub fn terms(&self) -> Vec<&SearchElement> {
        let mut terms = Vec::new();
        let mut current = Some(self);
        while let Some(term) = current {
            terms.push(term);
            current = term.previous.as_deref();
        }
        terms.reverse();
        terms
    }

    /// Fold the chain into a finalized search.
    ///
    /// Terms lacking a subject or a value are skipped and repeated subjects
    /// collect into an array. The first term of a chain started from an
    /// identified resource (`_id`) is kept as a plain filter; it is not yet
    /// bound as the subject of the terms that follow it.
    pub fn into_search(self) -> FhirSearch {
        let mut params = SearchParams::new();
        let mut resource_name = self.resource_type.clone();

        for term in self.terms() {
            resource_name.clone_from(&term.resource_type);
            let (Some(subject), Some(reference)) = (&term.subject, &term.reference) else {
                continue;
            };
            let value = JsonValue::String(reference.clone());
            match params.get_mut(subject) {
                Some(JsonValue::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = JsonValue::Array(vec![first, value]);
                }
                None => {
                    params.insert(subject.clone(), value);
                }
            }
        }

        FhirSearch::new(resource_name, params)
    }
}

/// What a dual-mode search entry point hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchStart {
    Search(FhirSearch),
    Chain(SearchElement),
}

impl SearchStart {
    pub fn as_search(&self) -> Option<&FhirSearch> {
        match self {
            SearchStart::Search(search) => Some(search),
            SearchStart::Chain(_) => None,
        }
    }

    pub fn as_chain(&self) -> Option<&SearchElement> {
        match self {
            SearchStart::Search(_) => None,
            SearchStart::Chain(element) => Some(element),
        }
    }

    /// Finalize either variant into a search
    pub fn into_search(self) -> FhirSearch {
        match self {
            SearchStart::Search(search) => search,
            SearchStart::Chain(element) => element.into_search(),
        }
    }
}

/// Type-level search entry point.
///
/// With a mapping, returns a finalized search for `R`; without one, an empty
/// chain root tagged with `R`.
pub fn where_<R: FhirResource>(spec: Option<SearchParams>) -> SearchStart {
    where_named(R::RESOURCE_NAME, spec)
}

/// Same as [`where_`] for a resource type known only by name.
pub fn where_named(resource_name: &str, spec: Option<SearchParams>) -> SearchStart {
    match spec {
        Some(params) => SearchStart::Search(FhirSearch::new(resource_name, params)),
        None => SearchStart::Chain(SearchElement::root(resource_name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: JsonValue) -> SearchParams {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn construct_without_params_is_bare_type() {
        let search = FhirSearch::new("Patient", SearchParams::new());
        assert_eq!(search.construct(), "Patient");
    }

    #[test]
    fn construct_encodes_values_in_order() {
        let search = FhirSearch::new(
            "Patient",
            params(json!({"name": "van der Berg", "birthdate": "ge1990-01-01", "_count": 10})),
        );
        assert_eq!(
            search.construct(),
            "Patient?name=van%20der%20Berg&birthdate=ge1990-01-01&_count=10"
        );
    }

    #[test]
    fn construct_expands_arrays_and_modifiers() {
        let search = FhirSearch::new(
            "Observation",
            params(json!({
                "code": ["1234-5", "6789-0"],
                "subject": {"$missing": true},
                "status": null
            })),
        );
        assert_eq!(
            search.construct(),
            "Observation?code=1234-5&code=6789-0&subject:missing=true"
        );
    }

    #[test]
    fn chain_terms_are_oldest_first() {
        let chain = SearchElement::root("Patient")
            .and("name")
            .with_reference("smith")
            .and("gender")
            .with_reference("male");

        let subjects: Vec<_> = chain
            .terms()
            .into_iter()
            .map(|t| t.subject.as_deref())
            .collect();
        assert_eq!(subjects, vec![None, Some("name"), Some("gender")]);
    }

    #[test]
    fn chain_folds_into_search() {
        let search = SearchElement::new("_id", "Patient")
            .with_reference("42")
            .and("name")
            .with_reference("x")
            .and("name")
            .with_reference("y")
            .and("gender")
            .into_search();

        assert_eq!(search.resource_name, "Patient");
        assert_eq!(
            JsonValue::Object(search.params),
            json!({"_id": "42", "name": ["x", "y"]})
        );
    }

    #[test]
    fn root_is_detected() {
        assert!(SearchElement::root("Patient").is_root());
        assert!(!SearchElement::root("Patient").and("name").is_root());
    }

    #[test]
    fn where_named_selects_mode() {
        let finalized = where_named("Encounter", Some(params(json!({"status": "finished"}))));
        assert_eq!(
            finalized.as_search().map(|s| s.construct()),
            Some("Encounter?status=finished".to_string())
        );

        let chain = where_named("Encounter", None);
        assert_eq!(chain.as_chain(), Some(&SearchElement::root("Encounter")));
    }
}
