//! Template rendering
//!
//! Merges a template, the form values and the selected capsules into one
//! HTML string. Every `{{ variable }}` token of a listed variable becomes an
//! inline placeholder element; anything else passes through verbatim.
//!
//! Variables are substituted one at a time, in list order, replacing every
//! occurrence of that variable before moving on. Placeholder elements never
//! contain a `{{`, so a variable listed twice finds nothing on its second
//! pass.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use shared_types::{Capsule, CapsuleSelection, FormData};
use tracing::{debug, trace, warn};

use crate::config::EditorConfig;

lazy_static! {
    // Any `{{ ... }}` token, used only for variable discovery
    static ref ANY_PLACEHOLDER: Regex = Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").unwrap();
}

/// Everything a render depends on
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub template: &'a str,
    pub variables: &'a [String],
    pub form: &'a FormData,
    pub active_field: Option<&'a str>,
    pub selection: &'a CapsuleSelection,
    pub capsules: &'a [Capsule],
}

/// One placeholder element emitted by the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSlot {
    /// Position on the surface, also written to the index attribute
    pub index: usize,
    pub variable: String,
    /// Human-readable label shown while the field is empty
    pub label: String,
    pub filled: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub fields: Vec<FieldSlot>,
}

/// Result of a render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// The template was empty; the host shows its own placeholder state
    NoContent,
    Document(RenderedDocument),
}

impl Rendered {
    pub fn html(&self) -> Option<&str> {
        match self {
            Rendered::NoContent => None,
            Rendered::Document(doc) => Some(&doc.html),
        }
    }

    pub fn into_html(self) -> Option<String> {
        match self {
            Rendered::NoContent => None,
            Rendered::Document(doc) => Some(doc.html),
        }
    }

    pub fn fields(&self) -> &[FieldSlot] {
        match self {
            Rendered::NoContent => &[],
            Rendered::Document(doc) => &doc.fields,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    config: EditorConfig,
}

impl TemplateRenderer {
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn render(&self, input: &RenderInput<'_>) -> Rendered {
        if input.template.trim().is_empty() {
            debug!("Empty template, nothing to render");
            return Rendered::NoContent;
        }

        let patterns = compile_patterns(input.variables);
        let mut fields = Vec::new();
        let mut html = self.substitute(input.template, &patterns, input, &mut fields);

        if !input.selection.is_empty() {
            let clauses: Vec<String> = input
                .capsules
                .iter()
                .filter(|capsule| input.selection.contains(capsule.id))
                .filter_map(|capsule| {
                    let text = capsule.legal_text.as_deref().unwrap_or("");
                    let merged = self.substitute(text, &patterns, input, &mut fields);
                    if merged.is_empty() {
                        trace!(capsule = capsule.id, "Selected capsule has no legal text");
                        None
                    } else {
                        Some(merged)
                    }
                })
                .collect();

            if !clauses.is_empty() {
                html.push_str(&format!(
                    "\n\n<div class=\"{}\">\n<h3>{}</h3>\n\n{}\n</div>",
                    escape_html(&self.config.clauses_class),
                    escape_html(&self.config.clauses_heading),
                    clauses.join("\n\n")
                ));
            }
        }

        debug!(fields = fields.len(), bytes = html.len(), "Rendered template");
        Rendered::Document(RenderedDocument { html, fields })
    }

    fn substitute(
        &self,
        text: &str,
        patterns: &[(&str, Regex)],
        input: &RenderInput<'_>,
        fields: &mut Vec<FieldSlot>,
    ) -> String {
        let mut working = text.to_string();

        for (name, pattern) in patterns {
            let filled = input.form.is_filled(name);
            let active = input.active_field == Some(*name);
            let value = input.form.get(name);

            let next = pattern
                .replace_all(&working, |_: &Captures<'_>| {
                    let slot = FieldSlot {
                        index: fields.len(),
                        variable: name.to_string(),
                        label: placeholder_label(name),
                        filled,
                        active,
                    };
                    let element = self.placeholder_element(&slot, value);
                    fields.push(slot);
                    element
                })
                .into_owned();
            working = next;
        }

        working
    }

    fn placeholder_element(&self, slot: &FieldSlot, value: &str) -> String {
        let content = if slot.filled {
            value
        } else {
            slot.label.as_str()
        };
        let editable = if self.config.editable {
            " contenteditable=\"true\""
        } else {
            ""
        };
        format!(
            "<span class=\"{}\" {}=\"{}\" {}=\"{}\"{}>{}</span>",
            self.config.field_class_list(slot.filled, slot.active),
            self.config.variable_attribute,
            escape_html(&slot.variable),
            self.config.index_attribute,
            slot.index,
            editable,
            escape_html(content)
        )
    }
}

/// Render with the default configuration; `None` for an empty template
pub fn render(
    template: &str,
    variables: &[String],
    form: &FormData,
    active_field: Option<&str>,
    selection: &CapsuleSelection,
    capsules: &[Capsule],
) -> Option<String> {
    TemplateRenderer::default()
        .render(&RenderInput {
            template,
            variables,
            form,
            active_field,
            selection,
            capsules,
        })
        .into_html()
}

fn compile_patterns(variables: &[String]) -> Vec<(&str, Regex)> {
    variables
        .iter()
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            let source = format!(r"\{{\{{\s*{}\s*\}}\}}", regex::escape(name));
            match Regex::new(&source) {
                Ok(pattern) => Some((name, pattern)),
                Err(e) => {
                    warn!(variable = name, error = %e, "Skipping unmatchable variable");
                    None
                }
            }
        })
        .collect()
}

/// Label for an empty field: underscores become spaces, words capitalized.
///
/// `nome_do_locatario` -> `Nome Do Locatario`
pub fn placeholder_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphanumeric() {
            if at_word_start {
                label.extend(c.to_uppercase());
            } else {
                label.push(c);
            }
            at_word_start = false;
        } else {
            label.push(c);
            at_word_start = true;
        }
    }
    label
}

/// Variable names referenced by a template, first occurrence first
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in ANY_PLACEHOLDER.captures_iter(template) {
        let name = caps[1].trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Escape text for element content and attribute values. Braces are
/// encoded too, so a typed `{{x}}` can't be picked up by a later pass.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    fn render_plain(template: &str, variables: &[String], form: &FormData) -> String {
        render(
            template,
            variables,
            form,
            None,
            &CapsuleSelection::new(),
            &[],
        )
        .unwrap()
    }

    fn capsule(id: u32, price: f64, legal_text: Option<&str>) -> Capsule {
        Capsule {
            id,
            title: format!("Cláusula {}", id),
            price,
            legal_text: legal_text.map(str::to_string),
        }
    }

    #[test]
    fn test_filled_placeholder() {
        let html = render_plain("Olá {{nome}}!", &vars(&["nome"]), &form(&[("nome", "Ana")]));
        assert_eq!(
            html,
            "Olá <span class=\"variable-field filled\" data-variable=\"nome\" data-field=\"0\" contenteditable=\"true\">Ana</span>!"
        );
    }

    #[test]
    fn test_empty_placeholder_shows_label() {
        let html = render_plain("{{ nome_completo }}", &vars(&["nome_completo"]), &form(&[]));
        assert_eq!(
            html,
            "<span class=\"variable-field empty\" data-variable=\"nome_completo\" data-field=\"0\" contenteditable=\"true\">Nome Completo</span>"
        );
    }

    #[test]
    fn test_whitespace_value_counts_as_empty() {
        let html = render_plain("{{a}}", &vars(&["a"]), &form(&[("a", "  ")]));
        assert!(html.contains("variable-field empty"));
        assert!(html.contains(">A</span>"));
    }

    #[test]
    fn test_duplicate_tokens_all_replaced() {
        let variables = vars(&["x"]);
        let rendered = TemplateRenderer::default().render(&RenderInput {
            template: "{{x}} and {{ x }}",
            variables: &variables,
            form: &form(&[("x", "A")]),
            active_field: None,
            selection: &CapsuleSelection::new(),
            capsules: &[],
        });
        let html = rendered.html().unwrap();
        assert!(!html.contains("{{"));
        assert_eq!(html.matches(">A</span>").count(), 2);
        assert_eq!(rendered.fields().len(), 2);
    }

    #[test]
    fn test_duplicate_variable_in_list_is_noop() {
        let once = render_plain("{{x}}", &vars(&["x"]), &form(&[("x", "1")]));
        let twice = render_plain("{{x}}", &vars(&["x", "x"]), &form(&[("x", "1")]));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_token_passthrough() {
        let html = render_plain("Hello {{unknown}}", &[], &form(&[]));
        assert_eq!(html, "Hello {{unknown}}");
    }

    #[test]
    fn test_malformed_braces_pass_through() {
        let html = render_plain("{{a} and {{ b and }}", &vars(&["a", "b"]), &form(&[]));
        assert_eq!(html, "{{a} and {{ b and }}");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let html = render_plain("{{Nome}}", &vars(&["nome"]), &form(&[("nome", "x")]));
        assert_eq!(html, "{{Nome}}");
    }

    #[test]
    fn test_regex_metacharacters_in_name() {
        let html = render_plain("{{a.b}} {{axb}}", &vars(&["a.b"]), &form(&[("a.b", "ok")]));
        assert!(html.contains(">ok</span>"));
        assert!(html.ends_with("{{axb}}"));
    }

    #[test]
    fn test_empty_variable_names_skipped() {
        let html = render_plain("{{}} {{a}}", &vars(&["", "a"]), &form(&[]));
        assert!(html.starts_with("{{}} "));
        assert!(html.contains("data-variable=\"a\""));
    }

    #[test]
    fn test_empty_template_is_no_content() {
        let rendered = TemplateRenderer::default().render(&RenderInput {
            template: "",
            variables: &[],
            form: &FormData::new(),
            active_field: None,
            selection: &CapsuleSelection::new(),
            capsules: &[],
        });
        assert_eq!(rendered, Rendered::NoContent);
        assert_eq!(render("  \n", &[], &FormData::new(), None, &CapsuleSelection::new(), &[]), None);
    }

    #[test]
    fn test_template_without_placeholders_is_verbatim() {
        let html = render_plain("Contrato simples.", &vars(&["a"]), &form(&[]));
        assert_eq!(html, "Contrato simples.");
    }

    #[test]
    fn test_active_field_highlighted() {
        let variables = vars(&["a", "b"]);
        let html = render(
            "{{a}} {{b}}",
            &variables,
            &form(&[]),
            Some("b"),
            &CapsuleSelection::new(),
            &[],
        )
        .unwrap();
        assert!(html.contains("class=\"variable-field empty\" data-variable=\"a\""));
        assert!(html.contains("class=\"variable-field empty active\" data-variable=\"b\""));
    }

    #[test]
    fn test_values_are_escaped() {
        let html = render_plain(
            "{{a}} {{b}}",
            &vars(&["a", "b"]),
            &form(&[("a", "<b>{{b}}</b>"), ("b", "B")]),
        );
        assert!(html.contains("&lt;b&gt;&#123;&#123;b&#125;&#125;&lt;/b&gt;"));
        assert_eq!(html.matches("data-variable=\"b\"").count(), 1);
    }

    #[test]
    fn test_not_editable_config() {
        let config = EditorConfig {
            editable: false,
            ..EditorConfig::default()
        };
        let variables = vars(&["a"]);
        let html = TemplateRenderer::new(config)
            .render(&RenderInput {
                template: "{{a}}",
                variables: &variables,
                form: &FormData::new(),
                active_field: None,
                selection: &CapsuleSelection::new(),
                capsules: &[],
            })
            .into_html()
            .unwrap();
        assert!(!html.contains("contenteditable"));
    }

    #[test]
    fn test_selected_capsules_appended_in_catalog_order() {
        let capsules = vec![
            capsule(1, 100.0, Some("Primeira {{nome}}.")),
            capsule(2, 200.0, Some("Segunda.")),
            capsule(3, 300.0, Some("Terceira.")),
        ];
        let selection = CapsuleSelection::from(vec![3, 1]);
        let variables = vars(&["nome"]);
        let html = render(
            "Corpo",
            &variables,
            &form(&[("nome", "Ana")]),
            None,
            &selection,
            &capsules,
        )
        .unwrap();

        assert!(html.starts_with("Corpo\n\n<div class=\"additional-clauses\">\n<h3>CLÁUSULAS ADICIONAIS</h3>\n\n"));
        let first = html.find("Primeira").unwrap();
        let third = html.find("Terceira").unwrap();
        assert!(first < third);
        assert!(!html.contains("Segunda"));
        assert!(html.contains(">Ana</span>."));
        assert!(html.ends_with("Terceira.\n</div>"));
    }

    #[test]
    fn test_capsule_shares_form_values_with_main_template() {
        let capsules = vec![capsule(7, 0.0, Some("Foro: {{shared_var}}"))];
        let variables = vars(&["shared_var"]);
        let f = form(&[("shared_var", "Recife")]);
        let rendered = TemplateRenderer::default().render(&RenderInput {
            template: "Cidade {{shared_var}}",
            variables: &variables,
            form: &f,
            active_field: None,
            selection: &CapsuleSelection::from(vec![7]),
            capsules: &capsules,
        });
        let html = rendered.html().unwrap();
        assert_eq!(html.matches(">Recife</span>").count(), 2);
        let indexes: Vec<usize> = rendered.fields().iter().map(|f| f.index).collect();
        assert_eq!(indexes, vec![0, 1]);
    }

    #[test]
    fn test_capsules_without_text_leave_no_section() {
        let capsules = vec![capsule(1, 10.0, None), capsule(2, 10.0, Some(""))];
        let html = render(
            "Corpo",
            &[],
            &FormData::new(),
            None,
            &CapsuleSelection::from(vec![1, 2]),
            &capsules,
        )
        .unwrap();
        assert_eq!(html, "Corpo");
    }

    #[test]
    fn test_whitespace_only_capsule_is_kept() {
        let capsules = vec![capsule(1, 10.0, None), capsule(2, 10.0, Some(" "))];
        let html = render(
            "Corpo",
            &[],
            &FormData::new(),
            None,
            &CapsuleSelection::from(vec![1, 2]),
            &capsules,
        )
        .unwrap();
        assert_eq!(
            html,
            "Corpo\n\n<div class=\"additional-clauses\">\n<h3>CLÁUSULAS ADICIONAIS</h3>\n\n \n</div>"
        );
    }

    #[test]
    fn test_unselected_capsule_contributes_nothing() {
        let capsules = vec![capsule(1, 10.0, Some("Extra"))];
        let html = render("Corpo", &[], &FormData::new(), None, &CapsuleSelection::new(), &capsules)
            .unwrap();
        assert_eq!(html, "Corpo");
    }

    #[test]
    fn test_variable_only_in_capsule_needs_listing() {
        let capsules = vec![capsule(1, 10.0, Some("Multa {{multa}}"))];
        let html = render(
            "Corpo",
            &[],
            &form(&[("multa", "10%")]),
            None,
            &CapsuleSelection::from(vec![1]),
            &capsules,
        )
        .unwrap();
        assert!(html.contains("Multa {{multa}}"));
    }

    #[test]
    fn test_placeholder_label() {
        assert_eq!(placeholder_label("nome_do_locatario"), "Nome Do Locatario");
        assert_eq!(placeholder_label("cpf"), "Cpf");
        assert_eq!(placeholder_label("data_2via"), "Data 2via");
        assert_eq!(placeholder_label("endereço_imóvel"), "Endereço Imóvel");
        assert_eq!(placeholder_label(""), "");
    }

    #[test]
    fn test_extract_variables() {
        let names = extract_variables("{{ a }} {{b}} {{a}} {{}} {c}");
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn name_strategy() -> impl Strategy<Value = String> {
            "[a-z][a-z_]{0,8}"
        }

        proptest! {
            #[test]
            fn no_listed_token_survives(
                names in prop::collection::vec(name_strategy(), 1..6),
                values in prop::collection::vec(".{0,12}", 6),
                pad in "[ ]{0,2}",
            ) {
                let template: String = names
                    .iter()
                    .map(|n| format!("Campo {{{{{pad}{n}{pad}}}}}; "))
                    .collect();
                let f: FormData = names
                    .iter()
                    .zip(values.iter())
                    .map(|(n, v)| (n.clone(), v.clone()))
                    .collect();
                let html = render(&template, &names, &f, None, &CapsuleSelection::new(), &[]).unwrap();
                for n in &names {
                    let bare = format!("{{{{{}}}}}", n);
                    let spaced = format!("{{{{{pad}{n}{pad}}}}}");
                    prop_assert!(!html.contains(&bare));
                    prop_assert!(!html.contains(&spaced));
                }
            }

            #[test]
            fn rendering_is_pure(
                names in prop::collection::vec(name_strategy(), 0..5),
                value in ".{0,10}",
                active in prop::option::of(name_strategy()),
            ) {
                let template: String = names.iter().map(|n| format!("{{{{{}}}}} ", n)).collect();
                let f: FormData = names.iter().map(|n| (n.clone(), value.clone())).collect();
                let selection = CapsuleSelection::new();
                let first = render(&template, &names, &f, active.as_deref(), &selection, &[]);
                let second = render(&template, &names, &f, active.as_deref(), &selection, &[]);
                prop_assert_eq!(first, second);
            }
        }
    }
}
