//! `workflow_dispatch` form: a ref picker followed by one field per declared
//! input, then Cancel / Build buttons.

use crate::app::{InputKind, RefOptions, Workflow, WorkflowInput};

pub const REF_LABEL: &str = "ref / branch / tag";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Ref,
    String,
    Boolean,
    Choice,
    Environment,
}

impl From<InputKind> for FieldKind {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::String => FieldKind::String,
            InputKind::Boolean => FieldKind::Boolean,
            InputKind::Choice => FieldKind::Choice,
            InputKind::Environment => FieldKind::Environment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: String,
    pub description: String,
    pub kind: FieldKind,
    pub options: Vec<String>,
    pub required: bool,
    pub option_idx: usize,
    pub value: String,
    /// Shown greyed out when `value` is empty.
    pub placeholder: String,
}

impl FormField {
    fn text(label: &str, kind: FieldKind, value: String) -> Self {
        Self {
            label: label.to_string(),
            description: String::new(),
            kind,
            options: Vec::new(),
            required: false,
            option_idx: 0,
            value,
            placeholder: String::new(),
        }
    }

    fn from_input(input: &WorkflowInput) -> Self {
        let kind = FieldKind::from(input.kind);
        let mut field = Self {
            label: input.name.clone(),
            description: input.description.clone(),
            kind,
            options: input.options.clone(),
            required: input.required,
            option_idx: 0,
            value: input.default.clone(),
            placeholder: String::new(),
        };
        match kind {
            FieldKind::Boolean => {
                field.value = if input.default == "true" { "true" } else { "false" }.to_string();
            }
            FieldKind::Choice => {
                field.option_idx = input
                    .options
                    .iter()
                    .position(|o| *o == input.default)
                    .unwrap_or(0);
                if field.value.is_empty() {
                    field.value = input.options.first().cloned().unwrap_or_default();
                }
            }
            _ => {}
        }
        field
    }

    /// Accepts free text.
    fn is_text(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Ref | FieldKind::String | FieldKind::Environment
        )
    }
}

/// Where the ref picker's selection comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefSection {
    #[default]
    Input,
    Branches,
    Tags,
}

impl RefSection {
    fn next(self) -> Self {
        match self {
            RefSection::Input => RefSection::Branches,
            RefSection::Branches => RefSection::Tags,
            RefSection::Tags => RefSection::Input,
        }
    }

    fn prev(self) -> Self {
        match self {
            RefSection::Input => RefSection::Tags,
            RefSection::Branches => RefSection::Input,
            RefSection::Tags => RefSection::Branches,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(usize),
    Cancel,
    Build,
}

/// Keys the form understands, already decoded by `input::map_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Cancel,
    Next,
    Prev,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Char(char),
    Backspace,
    ClearLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    None,
    Cancel,
    Submit {
        git_ref: String,
        inputs: Vec<(String, String)>,
    },
}

/// Case-insensitive substring match, preserving order.
pub fn filter_refs(refs: &[String], query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    refs.iter()
        .filter(|r| needle.is_empty() || r.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchForm {
    pub workflow: Workflow,
    pub fields: Vec<FormField>,
    pub focus: Focus,
    pub refs: RefOptions,
    pub section: RefSection,
    pub branch_idx: usize,
    pub tag_idx: usize,
    default_ref: String,
}

impl DispatchForm {
    /// Field 0 is always the ref picker, seeded with `default_ref`.
    pub fn new(workflow: Workflow, inputs: &[WorkflowInput], default_ref: &str) -> Self {
        let mut fields = vec![FormField::text(REF_LABEL, FieldKind::Ref, default_ref.to_string())];
        fields.extend(inputs.iter().map(FormField::from_input));
        Self {
            workflow,
            fields,
            focus: Focus::Field(0),
            refs: RefOptions::default(),
            section: RefSection::Input,
            branch_idx: 0,
            tag_idx: 0,
            default_ref: default_ref.to_string(),
        }
    }

    /// Install branch and tag names. If the ref field holds a known branch it
    /// is preselected in the Branches list and the text becomes a placeholder,
    /// leaving an empty filter that shows every ref.
    pub fn set_refs(&mut self, refs: RefOptions) {
        self.refs = refs;
        let Some(field) = self.fields.first_mut() else {
            return;
        };
        if let Some(i) = self.refs.branches.iter().position(|b| *b == field.value) {
            self.section = RefSection::Branches;
            self.branch_idx = i;
            field.placeholder = std::mem::take(&mut field.value);
        }
    }

    pub fn ref_query(&self) -> &str {
        self.fields.first().map_or("", |f| f.value.as_str())
    }

    pub fn filtered_branches(&self) -> Vec<String> {
        filter_refs(&self.refs.branches, self.ref_query())
    }

    pub fn filtered_tags(&self) -> Vec<String> {
        filter_refs(&self.refs.tags, self.ref_query())
    }

    /// The ref highlighted in the active list section, if any.
    fn highlighted_ref(&self) -> Option<String> {
        let (list, idx) = match self.section {
            RefSection::Input => return None,
            RefSection::Branches => (self.filtered_branches(), self.branch_idx),
            RefSection::Tags => (self.filtered_tags(), self.tag_idx),
        };
        let last = list.len().checked_sub(1)?;
        list.get(idx.min(last)).cloned()
    }

    /// Ref to dispatch against: list selection, typed text, then default.
    pub fn resolved_ref(&self) -> String {
        let typed = self.ref_query().to_string();
        let chosen = self.highlighted_ref().unwrap_or(typed);
        if !chosen.is_empty() {
            chosen
        } else if !self.default_ref.is_empty() {
            self.default_ref.clone()
        } else {
            crate::app::FALLBACK_REF.to_string()
        }
    }

    /// Non-empty input values in declaration order.
    pub fn input_values(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .skip(1)
            .filter(|f| !f.value.is_empty())
            .map(|f| (f.label.clone(), f.value.clone()))
            .collect()
    }

    pub fn handle(&mut self, action: FormAction) -> FormOutcome {
        match action {
            FormAction::Cancel => return FormOutcome::Cancel,
            FormAction::Next => self.focus_next(),
            FormAction::Prev => self.focus_prev(),
            FormAction::Enter => return self.enter(),
            _ => match self.focus {
                Focus::Cancel | Focus::Build => {
                    if matches!(action, FormAction::Left | FormAction::Right) {
                        self.focus = if self.focus == Focus::Cancel {
                            Focus::Build
                        } else {
                            Focus::Cancel
                        };
                    }
                }
                Focus::Field(i) => self.field_key(i, action),
            },
        }
        FormOutcome::None
    }

    fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Cancel | Focus::Build => Focus::Field(0),
            Focus::Field(i) if i + 1 >= self.fields.len() => Focus::Build,
            Focus::Field(i) => Focus::Field(i + 1),
        };
    }

    fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Focus::Cancel | Focus::Build => Focus::Field(self.fields.len().saturating_sub(1)),
            Focus::Field(0) => Focus::Cancel,
            Focus::Field(i) => Focus::Field(i - 1),
        };
    }

    fn enter(&mut self) -> FormOutcome {
        match self.focus {
            Focus::Cancel => FormOutcome::Cancel,
            Focus::Build => FormOutcome::Submit {
                git_ref: self.resolved_ref(),
                inputs: self.input_values(),
            },
            Focus::Field(0) => {
                if let Some(chosen) = self.highlighted_ref() {
                    if let Some(field) = self.fields.first_mut() {
                        field.value = chosen;
                        field.placeholder.clear();
                    }
                    self.section = RefSection::Input;
                }
                FormOutcome::None
            }
            Focus::Field(_) => FormOutcome::None,
        }
    }

    fn field_key(&mut self, i: usize, action: FormAction) {
        let Some(kind) = self.fields.get(i).map(|f| f.kind) else {
            return;
        };
        match kind {
            FieldKind::Ref => self.ref_key(action),
            FieldKind::Choice => {
                let field = &mut self.fields[i];
                let n = field.options.len();
                if n == 0 {
                    return;
                }
                match action {
                    FormAction::Up | FormAction::Char('k') => {
                        field.option_idx = (field.option_idx + n - 1) % n;
                    }
                    FormAction::Down | FormAction::Char('j') => {
                        field.option_idx = (field.option_idx + 1) % n;
                    }
                    _ => return,
                }
                field.value = field.options[field.option_idx].clone();
            }
            FieldKind::Boolean => {
                if matches!(
                    action,
                    FormAction::Up
                        | FormAction::Down
                        | FormAction::Char('k' | 'j' | ' ')
                ) {
                    let field = &mut self.fields[i];
                    field.value = if field.value == "true" { "false" } else { "true" }.to_string();
                }
            }
            FieldKind::String | FieldKind::Environment => edit_text(&mut self.fields[i], action),
        }
    }

    fn ref_key(&mut self, action: FormAction) {
        match (self.section, action) {
            (_, FormAction::Left) => self.section = self.section.prev(),
            (_, FormAction::Right) => self.section = self.section.next(),
            (RefSection::Branches, FormAction::Up | FormAction::Char('k')) => {
                self.branch_idx = self.branch_idx.saturating_sub(1);
            }
            (RefSection::Branches, FormAction::Down | FormAction::Char('j')) => {
                if self.branch_idx + 1 < self.filtered_branches().len() {
                    self.branch_idx += 1;
                }
            }
            (RefSection::Tags, FormAction::Up | FormAction::Char('k')) => {
                self.tag_idx = self.tag_idx.saturating_sub(1);
            }
            (RefSection::Tags, FormAction::Down | FormAction::Char('j')) => {
                if self.tag_idx + 1 < self.filtered_tags().len() {
                    self.tag_idx += 1;
                }
            }
            _ => {
                if let Some(field) = self.fields.first_mut() {
                    edit_text(field, action);
                }
                let branches = self.filtered_branches().len();
                let tags = self.filtered_tags().len();
                self.branch_idx = self.branch_idx.min(branches.saturating_sub(1));
                self.tag_idx = self.tag_idx.min(tags.saturating_sub(1));
            }
        }
    }
}

fn edit_text(field: &mut FormField, action: FormAction) {
    if !field.is_text() {
        return;
    }
    match action {
        FormAction::Char(c) => field.value.push(c),
        FormAction::Backspace => {
            field.value.pop();
        }
        FormAction::ClearLine => field.value.clear(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn workflow() -> Workflow {
        Workflow {
            id: 42,
            name: "Deploy".to_string(),
            path: ".github/workflows/deploy.yml".to_string(),
            state: "active".to_string(),
        }
    }

    fn input(name: &str, kind: InputKind, default: &str, options: &[&str]) -> WorkflowInput {
        WorkflowInput {
            name: name.to_string(),
            description: String::new(),
            kind,
            default: default.to_string(),
            required: false,
            options: options.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn refs() -> RefOptions {
        RefOptions {
            branches: vec!["develop".to_string(), "main".to_string(), "release/1".to_string()],
            tags: vec!["v1.0".to_string(), "v2.0".to_string()],
        }
    }

    fn form_with(inputs: &[WorkflowInput]) -> DispatchForm {
        DispatchForm::new(workflow(), inputs, "main")
    }

    fn type_str(form: &mut DispatchForm, s: &str) {
        for c in s.chars() {
            form.handle(FormAction::Char(c));
        }
    }

    // --- Construction ---

    #[test]
    fn builds_fields_with_defaults() {
        let form = form_with(&[
            input("env", InputKind::Choice, "", &["staging", "prod"]),
            input("dry_run", InputKind::Boolean, "yes", &[]),
            input("force", InputKind::Boolean, "true", &[]),
            input("level", InputKind::Choice, "prod", &["staging", "prod"]),
            input("note", InputKind::String, "hi", &[]),
        ]);
        let values: Vec<(&str, &str)> = form
            .fields
            .iter()
            .map(|f| (f.label.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                (REF_LABEL, "main"),
                ("env", "staging"),
                ("dry_run", "false"),
                ("force", "true"),
                ("level", "prod"),
                ("note", "hi"),
            ]
        );
        assert_eq!(form.fields[4].option_idx, 1);
    }

    #[test]
    fn set_refs_preselects_default_branch() {
        let mut form = form_with(&[]);
        form.set_refs(refs());
        assert_eq!(form.section, RefSection::Branches);
        assert_eq!(form.branch_idx, 1);
        assert_eq!(form.fields[0].value, "");
        assert_eq!(form.fields[0].placeholder, "main");
        assert_eq!(form.resolved_ref(), "main");
    }

    #[test]
    fn set_refs_unknown_value_stays_typed() {
        let mut form = DispatchForm::new(workflow(), &[], "trunk");
        form.set_refs(refs());
        assert_eq!(form.section, RefSection::Input);
        assert_eq!(form.fields[0].value, "trunk");
    }

    // --- Navigation ---

    #[test]
    fn tab_cycles_fields_and_buttons() {
        let mut form = form_with(&[input("a", InputKind::String, "", &[])]);
        form.handle(FormAction::Next);
        assert_eq!(form.focus, Focus::Field(1));
        form.handle(FormAction::Next);
        assert_eq!(form.focus, Focus::Build);
        form.handle(FormAction::Left);
        assert_eq!(form.focus, Focus::Cancel);
        form.handle(FormAction::Next);
        assert_eq!(form.focus, Focus::Field(0));
        form.handle(FormAction::Prev);
        assert_eq!(form.focus, Focus::Cancel);
        form.handle(FormAction::Prev);
        assert_eq!(form.focus, Focus::Field(1));
    }

    #[test]
    fn ref_sections_cycle_both_ways() {
        let mut form = form_with(&[]);
        form.handle(FormAction::Right);
        assert_eq!(form.section, RefSection::Branches);
        form.handle(FormAction::Right);
        assert_eq!(form.section, RefSection::Tags);
        form.handle(FormAction::Right);
        assert_eq!(form.section, RefSection::Input);
        form.handle(FormAction::Left);
        assert_eq!(form.section, RefSection::Tags);
    }

    #[test]
    fn typing_filters_and_clamps_lists() {
        let mut form = form_with(&[]);
        form.set_refs(refs());
        form.handle(FormAction::Down);
        assert_eq!(form.branch_idx, 2);
        type_str(&mut form, "rel");
        assert_eq!(form.filtered_branches(), vec!["release/1".to_string()]);
        assert_eq!(form.branch_idx, 0);
    }

    #[test]
    fn enter_on_list_copies_ref_into_field() {
        let mut form = form_with(&[]);
        form.set_refs(refs());
        form.handle(FormAction::Right);
        form.handle(FormAction::Char('j'));
        assert_eq!(form.tag_idx, 1);
        assert_eq!(form.handle(FormAction::Enter), FormOutcome::None);
        assert_eq!(form.fields[0].value, "v2.0");
        assert_eq!(form.section, RefSection::Input);
    }

    // --- Typed fields ---

    #[test]
    fn choice_cycles_with_wraparound() {
        let mut form = form_with(&[input("env", InputKind::Choice, "", &["a", "b", "c"])]);
        form.handle(FormAction::Next);
        form.handle(FormAction::Up);
        assert_eq!(form.fields[1].value, "c");
        form.handle(FormAction::Char('j'));
        assert_eq!(form.fields[1].value, "a");
    }

    #[test]
    fn boolean_toggles_and_ignores_text() {
        let mut form = form_with(&[input("dry", InputKind::Boolean, "", &[])]);
        form.handle(FormAction::Next);
        form.handle(FormAction::Char(' '));
        assert_eq!(form.fields[1].value, "true");
        form.handle(FormAction::Char('x'));
        assert_eq!(form.fields[1].value, "true");
        form.handle(FormAction::Down);
        assert_eq!(form.fields[1].value, "false");
    }

    #[test]
    fn string_field_edits() {
        let mut form = form_with(&[input("note", InputKind::String, "", &[])]);
        form.handle(FormAction::Next);
        type_str(&mut form, "hey");
        form.handle(FormAction::Backspace);
        assert_eq!(form.fields[1].value, "he");
        form.handle(FormAction::ClearLine);
        assert_eq!(form.fields[1].value, "");
    }

    // --- Submit ---

    #[test]
    fn build_submits_resolved_ref_and_non_empty_inputs() {
        let mut form = form_with(&[
            input("note", InputKind::String, "", &[]),
            input("dry", InputKind::Boolean, "", &[]),
        ]);
        form.set_refs(refs());
        form.focus = Focus::Build;
        assert_eq!(
            form.handle(FormAction::Enter),
            FormOutcome::Submit {
                git_ref: "main".to_string(),
                inputs: vec![("dry".to_string(), "false".to_string())],
            }
        );
    }

    #[test]
    fn empty_ref_falls_back_to_default() {
        let mut form = DispatchForm::new(workflow(), &[], "");
        assert_eq!(form.resolved_ref(), FALLBACK);
        type_str(&mut form, "feature");
        assert_eq!(form.resolved_ref(), "feature");
    }

    const FALLBACK: &str = crate::app::FALLBACK_REF;

    #[test]
    fn cancel_paths() {
        let mut form = form_with(&[]);
        assert_eq!(form.handle(FormAction::Cancel), FormOutcome::Cancel);
        form.focus = Focus::Cancel;
        assert_eq!(form.handle(FormAction::Enter), FormOutcome::Cancel);
    }
}
