//! Parameter Definition Differ
//!
//! Computes the structural delta between two definition snapshots. The result
//! is consumed by the render engine, which applies it to the live widget tree
//! in three passes: remove, add, change.

use indexmap::IndexMap;

use super::definition::{Parameter, ParameterDefinition, ParameterGroup};

/// Parameters added to one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAddition {
    /// The group header (name and label) without its parameters
    pub group: ParameterGroup,

    /// Added parameters in definition order, each with its `after` hint
    pub params: Vec<Parameter>,
}

/// Structural delta between two parameter definitions, keyed by group name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterDiff {
    pub to_remove: IndexMap<String, Vec<Parameter>>,
    pub to_add: IndexMap<String, GroupAddition>,
    pub to_change_data: IndexMap<String, Vec<Parameter>>,
}

impl ParameterDiff {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty() && self.to_change_data.is_empty()
    }

    /// Total number of parameter entries across all three passes
    pub fn len(&self) -> usize {
        self.to_remove.values().map(Vec::len).sum::<usize>()
            + self.to_add.values().map(|a| a.params.len()).sum::<usize>()
            + self.to_change_data.values().map(Vec::len).sum::<usize>()
    }
}

/// A parameter whose control must be rebuilt rather than updated in place.
fn is_structurally_changed(old: &Parameter, new: &Parameter) -> bool {
    old.render_type() != new.render_type()
        || old.label() != new.label()
        || old.multi_select != new.multi_select
}

/// Where a parameter lives in a definition and whether it gets a panel.
fn locate<'a>(defn: &'a ParameterDefinition, name: &str) -> Option<(&'a str, &'a Parameter)> {
    defn.parameter_groups.iter().find_map(|g| {
        g.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| (g.name.as_str(), p))
    })
}

/// Compute the diff that turns the panel for `old` into the panel for `new`.
///
/// `nulled` lists parameters the user explicitly emptied since the last
/// refresh; they are reported as changed even when their values match.
/// Neither definition is modified.
pub fn diff(old: &ParameterDefinition, new: &ParameterDefinition, nulled: &[String]) -> ParameterDiff {
    let mut result = ParameterDiff::default();

    for group in &old.parameter_groups {
        for param in group.parameters.iter().filter(|p| p.is_renderable()) {
            let keep = match locate(new, &param.name) {
                Some((new_group, new_param)) => {
                    new_param.is_renderable()
                        && new_group == group.name
                        && !is_structurally_changed(param, new_param)
                }
                None => false,
            };

            if !keep {
                result
                    .to_remove
                    .entry(group.name.clone())
                    .or_default()
                    .push(param.clone());
            }
        }
    }

    for group in &new.parameter_groups {
        let mut previous: Option<&str> = None;

        for param in group.parameters.iter().filter(|p| p.is_renderable()) {
            match locate(old, &param.name) {
                Some((old_group, old_param))
                    if old_param.is_renderable()
                        && old_group == group.name
                        && !is_structurally_changed(old_param, param) =>
                {
                    let values_changed = old_param.values != param.values;
                    let errors_changed = old.errors_for(&param.name) != new.errors_for(&param.name);
                    let forced = nulled.iter().any(|n| *n == param.name);

                    if values_changed || errors_changed || forced {
                        let mut changed = param.clone();
                        changed.is_error_changed = errors_changed;
                        changed.force_update = forced;
                        result
                            .to_change_data
                            .entry(group.name.clone())
                            .or_default()
                            .push(changed);
                    }
                }
                _ => {
                    let mut added = param.clone();
                    added.after = previous.map(str::to_string);
                    result
                        .to_add
                        .entry(group.name.clone())
                        .or_insert_with(|| GroupAddition {
                            group: group.header(),
                            params: Vec::new(),
                        })
                        .params
                        .push(added);
                }
            }

            previous = Some(param.name.as_str());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defn(groups: Vec<(&str, Vec<Parameter>)>) -> ParameterDefinition {
        ParameterDefinition {
            parameter_groups: groups
                .into_iter()
                .map(|(name, params)| ParameterGroup {
                    name: name.to_string(),
                    label: None,
                    parameters: params,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn names(params: &[Parameter]) -> Vec<&str> {
        params.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_identical_definitions_produce_empty_diff() {
        let a = defn(vec![("g", vec![Parameter::new("x").with_value("1", "One", true)])]);
        let result = diff(&a, &a.clone(), &[]);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_added_parameter_carries_after_hint() {
        let old = defn(vec![("g", vec![Parameter::new("a"), Parameter::new("c")])]);
        let new = defn(vec![(
            "g",
            vec![Parameter::new("a"), Parameter::new("b"), Parameter::new("c")],
        )]);

        let result = diff(&old, &new, &[]);
        let added = &result.to_add["g"];
        assert_eq!(names(&added.params), vec!["b"]);
        assert_eq!(added.params[0].after.as_deref(), Some("a"));
        assert!(added.group.parameters.is_empty());
        assert!(result.to_remove.is_empty());
    }

    #[test]
    fn test_after_hint_skips_hidden_siblings() {
        let old = defn(vec![("g", vec![Parameter::new("a")])]);
        let new = defn(vec![(
            "g",
            vec![
                Parameter::new("a"),
                Parameter::new("h").with_attribute("hidden", "true"),
                Parameter::new("b"),
            ],
        )]);

        let result = diff(&old, &new, &[]);
        assert_eq!(result.to_add["g"].params[0].after.as_deref(), Some("a"));
    }

    #[test]
    fn test_removed_and_hidden_parameters() {
        let old = defn(vec![("g", vec![Parameter::new("a"), Parameter::new("b")])]);
        let new = defn(vec![("g", vec![Parameter::new("a").with_attribute("hidden", "true")])]);

        let result = diff(&old, &new, &[]);
        assert_eq!(names(&result.to_remove["g"]), vec!["a", "b"]);
        assert!(result.to_add.is_empty());
    }

    #[test]
    fn test_unhidden_parameter_is_added() {
        let old = defn(vec![("g", vec![Parameter::new("a").with_attribute("hidden", "true")])]);
        let new = defn(vec![("g", vec![Parameter::new("a")])]);

        let result = diff(&old, &new, &[]);
        assert_eq!(names(&result.to_add["g"].params), vec!["a"]);
        assert!(result.to_remove.is_empty());
    }

    #[test]
    fn test_moved_parameter_is_removed_and_added() {
        let old = defn(vec![("g1", vec![Parameter::new("a")]), ("g2", vec![])]);
        let new = defn(vec![("g1", vec![]), ("g2", vec![Parameter::new("a")])]);

        let result = diff(&old, &new, &[]);
        assert_eq!(names(&result.to_remove["g1"]), vec!["a"]);
        assert_eq!(names(&result.to_add["g2"].params), vec!["a"]);
    }

    #[test]
    fn test_render_type_change_rebuilds_control() {
        let old = defn(vec![("g", vec![Parameter::new("a").with_attribute("parameter-render-type", "dropdown")])]);
        let new = defn(vec![("g", vec![Parameter::new("a").with_attribute("parameter-render-type", "list")])]);

        let result = diff(&old, &new, &[]);
        assert_eq!(names(&result.to_remove["g"]), vec!["a"]);
        assert_eq!(names(&result.to_add["g"].params), vec!["a"]);
    }

    #[test]
    fn test_value_and_error_changes() {
        let old = defn(vec![(
            "g",
            vec![
                Parameter::new("a").with_value("1", "1", true),
                Parameter::new("b").with_value("x", "x", false),
            ],
        )]);
        let mut new = defn(vec![(
            "g",
            vec![
                Parameter::new("a").with_value("1", "1", false),
                Parameter::new("b").with_value("x", "x", false),
            ],
        )]);
        new.errors.insert("b".to_string(), vec!["bad".to_string()]);

        let result = diff(&old, &new, &[]);
        let changed = &result.to_change_data["g"];
        assert_eq!(names(changed), vec!["a", "b"]);
        assert!(!changed[0].is_error_changed);
        assert!(changed[1].is_error_changed);
    }

    #[test]
    fn test_nulled_parameter_forces_update() {
        let a = defn(vec![("g", vec![Parameter::new("a").with_value("1", "1", false)])]);

        let result = diff(&a, &a.clone(), &["a".to_string()]);
        let changed = &result.to_change_data["g"];
        assert_eq!(names(changed), vec!["a"]);
        assert!(changed[0].force_update);
    }

    #[test]
    fn test_waiting_parameter_is_not_rendered() {
        let mut waiting = Parameter::new("dep");
        waiting.strict = true;
        let old = defn(vec![("g", vec![waiting.clone()])]);
        let new = defn(vec![("g", vec![waiting.with_value("1", "One", false)])]);

        let result = diff(&old, &new, &[]);
        assert_eq!(names(&result.to_add["g"].params), vec!["dep"]);
        assert!(result.to_remove.is_empty());
        assert!(result.to_change_data.is_empty());
    }

    #[test]
    fn test_inputs_are_untouched() {
        let old = defn(vec![("g", vec![Parameter::new("a")])]);
        let new = defn(vec![("g", vec![Parameter::new("a"), Parameter::new("b")])]);
        let (old_copy, new_copy) = (old.clone(), new.clone());

        let first = diff(&old, &new, &[]);
        let second = diff(&old, &new, &[]);
        assert_eq!(first, second);
        assert_eq!(old, old_copy);
        assert_eq!(new, new_copy);
    }
}
