//! Tests for state merging, path evaluation and templating.
use journey::error::PathError;
use journey::path::{JsonPath, PathEvaluator, Segment, parse_path};
use journey::state::{self, merge, merge_into};
use journey::template::{has_placeholders, render};
use pretty_assertions::assert_eq;
use serde_json::json;

#[cfg(test)]
mod merge_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_with_empty_patch_is_identity() {
        let trees = [
            json!({}),
            json!({ "a": 1 }),
            json!({ "a": { "b": [1, 2] }, "c": null }),
        ];
        for tree in trees {
            assert_eq!(merge(&tree, &state::empty()), tree);
        }
    }

    #[test]
    fn test_merge_preserves_sibling_keys() {
        let base = json!({ "user": { "name": "Ada", "age": 36 }, "flag": true });
        let patch = json!({ "user": { "age": 37 } });
        assert_eq!(
            merge(&base, &patch),
            json!({ "user": { "name": "Ada", "age": 37 }, "flag": true })
        );
    }

    #[test]
    fn test_non_object_values_replace_outright() {
        let base = json!({ "list": [1, 2, 3], "value": { "nested": 1 } });
        let patch = json!({ "list": [4], "value": "flat" });
        assert_eq!(merge(&base, &patch), json!({ "list": [4], "value": "flat" }));
    }

    #[test]
    fn test_merge_does_not_touch_the_base() {
        let base = json!({ "a": 1 });
        let merged = merge(&base, &json!({ "b": 2 }));
        assert_eq!(base, json!({ "a": 1 }));
        assert_eq!(merged, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn test_merge_into_over_scalar_base() {
        let mut base = json!(5);
        merge_into(&mut base, json!({ "a": 1 }));
        assert_eq!(base, json!({ "a": 1 }));
    }
}

#[cfg(test)]
mod path_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_supported_forms() {
        assert_eq!(parse_path("$").unwrap(), Vec::<Segment>::new());
        assert_eq!(
            parse_path("$.user.addresses[0]['post code']").unwrap(),
            vec![
                Segment::Field("user".into()),
                Segment::Field("addresses".into()),
                Segment::Index(0),
                Segment::Field("post code".into()),
            ]
        );
        assert_eq!(
            parse_path("items[*].id").unwrap(),
            vec![
                Segment::Field("items".into()),
                Segment::Wildcard,
                Segment::Field("id".into()),
            ]
        );
        assert_eq!(parse_path("$.a.*").unwrap(), parse_path("$.a[*]").unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        for path in ["$.a[", "$.", "$.a[x]", "$.a..b"] {
            assert!(
                matches!(parse_path(path), Err(PathError::InvalidExpression { .. })),
                "{} should be rejected",
                path
            );
        }
    }

    #[test]
    fn test_get_returns_every_match() {
        let tree = json!({ "items": [{ "id": 1 }, { "id": 2 }, { "other": 3 }] });
        let evaluator = JsonPath;
        assert_eq!(evaluator.get(&tree, "$.items[*].id").unwrap(), vec![json!(1), json!(2)]);
        assert_eq!(evaluator.get(&tree, "$.items[1]").unwrap(), vec![json!({ "id": 2 })]);
        assert_eq!(evaluator.get(&tree, "$.missing").unwrap(), Vec::<serde_json::Value>::new());
        assert_eq!(evaluator.get(&tree, "$").unwrap(), vec![tree.clone()]);
    }

    #[test]
    fn test_get_one_reports_missing_value() {
        let tree = json!({ "a": 1 });
        assert_eq!(
            JsonPath.get_one(&tree, "$.b"),
            Err(PathError::MissingPathValue("$.b".to_string()))
        );
        assert_eq!(JsonPath.get_one(&tree, "a"), Ok(json!(1)));
    }

    #[test]
    fn test_set_creates_missing_objects_without_mutating_input() {
        let tree = json!({ "keep": true });
        let updated = JsonPath.set(&tree, "$.user.profile.name", json!("Ada")).unwrap();
        assert_eq!(tree, json!({ "keep": true }));
        assert_eq!(
            updated,
            json!({ "keep": true, "user": { "profile": { "name": "Ada" } } })
        );
    }

    #[test]
    fn test_set_root_replaces_tree() {
        let tree = json!({ "a": 1 });
        assert_eq!(JsonPath.set(&tree, "$", json!([1, 2])).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_set_index_and_wildcard() {
        let tree = json!({ "items": [{ "n": 1 }, { "n": 2 }] });
        assert_eq!(
            JsonPath.set(&tree, "$.items[1].n", json!(20)).unwrap(),
            json!({ "items": [{ "n": 1 }, { "n": 20 }] })
        );
        assert_eq!(
            JsonPath.set(&tree, "$.items[*].seen", json!(true)).unwrap(),
            json!({ "items": [{ "n": 1, "seen": true }, { "n": 2, "seen": true }] })
        );
    }

    #[test]
    fn test_unsupported_mutations() {
        let tree = json!({ "name": "Ada", "items": [1], "empty": [] });
        for path in ["$.name.first", "$.items[3]", "$.empty[*]", "$.name[0]"] {
            assert!(
                matches!(
                    JsonPath.set(&tree, path, json!(1)),
                    Err(PathError::UnsupportedPathMutation { .. })
                ),
                "{} should not be settable",
                path
            );
        }
    }
}

#[cfg(test)]
mod template_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_substitutes_values() {
        let tree = json!({ "name": "Ada", "count": 3, "tags": ["a"] });
        assert_eq!(
            render("Hi {{ $.name }}, {{$.count}} new {{ tags }}", &tree, &JsonPath).unwrap(),
            "Hi Ada, 3 new [\"a\"]"
        );
        assert_eq!(render("no placeholders", &tree, &JsonPath).unwrap(), "no placeholders");
    }

    #[test]
    fn test_render_fails_on_missing_value() {
        let tree = json!({});
        assert_eq!(
            render("Hello {{ $.name }}", &tree, &JsonPath),
            Err(PathError::MissingPathValue("$.name".to_string()))
        );
    }

    #[test]
    fn test_has_placeholders() {
        assert!(has_placeholders("{{ $.a }}"));
        assert!(!has_placeholders("{ $.a }"));
    }
}
