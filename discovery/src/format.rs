//! Renders endpoints through `{{.Field}}` templates.
//!
//! The syntax is the subset of Go's text/template that makes sense for a flat
//! record: literal text, `{{.Target}}`, `{{.Port}}`, `{{.PortName}}`,
//! `{{.Net}}` and `{{.Service}}`, whitespace inside the braces, and the
//! `{{- ` / ` -}}` trim markers. Values are substituted as-is.

use std::str::FromStr;
use shared::types::Endpoint;

/// Template used when the caller doesn't supply one
pub const DEFAULT_TEMPLATE: &str = "Target: {{.Target}} Port: {{.Port}}";

/// Template the config client renders etcd endpoints with
pub const HTTP_URL_TEMPLATE: &str = "http://{{.Target}}:{{.Port}}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template syntax error at byte {offset}: {reason}")]
    Syntax { offset: usize, reason: String },

    #[error("template references unknown field '.{field}', expected one of .Target, .Port, .PortName, .Net, .Service")]
    UnknownField { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Target,
    Port,
    PortName,
    Net,
    Service,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Target" => Some(Field::Target),
            "Port" => Some(Field::Port),
            "PortName" => Some(Field::PortName),
            "Net" => Some(Field::Net),
            "Service" => Some(Field::Service),
            _ => None,
        }
    }

    fn write(self, endpoint: &Endpoint, out: &mut String) {
        match self {
            Field::Target => out.push_str(endpoint.target()),
            Field::Port => out.push_str(&endpoint.port().to_string()),
            Field::PortName => out.push_str(endpoint.port_name()),
            Field::Net => out.push_str(endpoint.network().as_str()),
            Field::Service => out.push_str(endpoint.service()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A compiled template. Field references are checked at compile time, so
/// rendering can't fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;
        let mut offset = 0;
        let mut trim_next = false;

        while let Some(start) = rest.find("{{") {
            push_text(&mut literal, &rest[..start], trim_next);

            let action_offset = offset + start;
            let inner = &rest[start + 2..];
            let end = inner.find("}}").ok_or_else(|| TemplateError::Syntax {
                offset: action_offset,
                reason: "unclosed action".to_string(),
            })?;
            let mut action = &inner[..end];

            // Trim markers need whitespace next to the dash
            if let Some(stripped) = action.strip_prefix('-') {
                if stripped.starts_with(TRIM_SPACE) {
                    let kept = literal.trim_end_matches(TRIM_SPACE).len();
                    literal.truncate(kept);
                    action = stripped;
                }
            }
            trim_next = false;
            if let Some(stripped) = action.strip_suffix('-') {
                if stripped.ends_with(TRIM_SPACE) {
                    trim_next = true;
                    action = stripped;
                }
            }

            let field = parse_action(action.trim(), action_offset)?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field(field));

            let consumed = start + 2 + end + 2;
            rest = &rest[consumed..];
            offset += consumed;
        }

        push_text(&mut literal, rest, trim_next);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, endpoint: &Endpoint) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => field.write(endpoint, &mut out),
            }
        }
        out
    }

    pub fn render_all(&self, endpoints: &[Endpoint]) -> Vec<String> {
        endpoints.iter().map(|endpoint| self.render(endpoint)).collect()
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

/// Trim markers only eat ASCII whitespace.
const TRIM_SPACE: [char; 4] = [' ', '\t', '\r', '\n'];

fn push_text(literal: &mut String, text: &str, trim_start: bool) {
    if trim_start {
        literal.push_str(text.trim_start_matches(TRIM_SPACE));
    } else {
        literal.push_str(text);
    }
}

fn parse_action(action: &str, offset: usize) -> Result<Field, TemplateError> {
    let syntax = |reason: &str| TemplateError::Syntax {
        offset,
        reason: reason.to_string(),
    };

    if action.is_empty() {
        return Err(syntax("empty action"));
    }
    let name = action
        .strip_prefix('.')
        .ok_or_else(|| syntax("expected a field reference such as .Target"))?;
    if name.is_empty() {
        return Err(syntax("'.' on its own is not supported, name a field"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(syntax("only a single field reference is allowed in an action"));
    }

    Field::from_name(name).ok_or_else(|| TemplateError::UnknownField {
        field: name.to_string(),
    })
}

/// Compiles `template` once and renders every endpoint with it.
/// On error nothing is rendered.
pub fn format(endpoints: &[Endpoint], template: &str) -> Result<Vec<String>, TemplateError> {
    let template = Template::parse(template)?;
    Ok(template.render_all(endpoints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::Network;

    fn endpoint(target: &str, port: u16) -> Endpoint {
        Endpoint::new("etcd", "client", Network::Tcp, target, port)
    }

    #[test]
    fn test_default_template() {
        let out = format(&[endpoint("10.0.0.5", 8080)], DEFAULT_TEMPLATE).unwrap();
        assert_eq!(out, vec!["Target: 10.0.0.5 Port: 8080".to_string()]);
    }

    #[test]
    fn test_one_string_per_endpoint() {
        let endpoints = vec![endpoint("10.0.0.5", 2379), endpoint("10.0.0.6", 2379), endpoint("etcd-2", 2380)];
        let out = format(&endpoints, HTTP_URL_TEMPLATE).unwrap();
        assert_eq!(
            out,
            vec!["http://10.0.0.5:2379", "http://10.0.0.6:2379", "http://etcd-2:2380"]
        );
    }

    #[test]
    fn test_all_fields() {
        let endpoint = Endpoint::new("dns", "dns-udp", Network::Udp, "kube-dns-0.", 53);
        let out = format(&[endpoint], "{{.Service}}/{{.PortName}}/{{.Net}} {{.Target}}:{{.Port}}").unwrap();
        assert_eq!(out, vec!["dns/dns-udp/udp kube-dns-0:53"]);
    }

    #[test]
    fn test_no_escaping() {
        let endpoint = Endpoint::new("svc", "a&b", Network::Tcp, "<host>", 1);
        let out = format(&[endpoint], "\"{{.PortName}}\" {{.Target}}").unwrap();
        assert_eq!(out, vec!["\"a&b\" <host>"]);
    }

    #[test]
    fn test_whitespace_and_trim_markers() {
        let template = Template::parse("host = {{ .Target }}  ,  {{- .Port -}}  !").unwrap();
        assert_eq!(template.render(&endpoint("a", 1)), "host = a  ,1!");
    }

    #[test]
    fn test_trim_keeps_non_ascii_space() {
        let template = Template::parse("a\u{a0} {{- .Port -}} \u{3000}b").unwrap();
        assert_eq!(template.render(&endpoint("a", 1)), "a\u{a0}1\u{3000}b");
    }

    #[test]
    fn test_dash_without_space_is_not_trim() {
        let err = Template::parse("x {{-.Port}}").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { offset: 2, .. }));
    }

    #[test]
    fn test_literal_only_and_empty() {
        assert_eq!(Template::parse("plain }} text").unwrap().render(&endpoint("a", 1)), "plain }} text");
        assert_eq!(Template::parse("").unwrap().render(&endpoint("a", 1)), "");
    }

    #[test]
    fn test_unknown_field_returns_nothing() {
        let endpoints = vec![endpoint("10.0.0.5", 2379), endpoint("10.0.0.6", 2379)];
        let err = format(&endpoints, "{{.Target}}:{{.Priority}}").unwrap_err();
        assert_eq!(err, TemplateError::UnknownField { field: "Priority".to_string() });
    }

    #[test]
    fn test_unknown_field_fails_without_endpoints() {
        assert!(format(&[], "{{.Weight}}").is_err());
    }

    #[test]
    fn test_syntax_errors() {
        let cases = [
            ("Target: {{.Target", 8),
            ("{{}}", 0),
            ("ab{{ Target }}", 2),
            ("{{.}}", 0),
            ("{{.Target .Port}}", 0),
        ];
        for (source, expected) in cases {
            match Template::parse(source) {
                Err(TemplateError::Syntax { offset, .. }) => assert_eq!(offset, expected, "{}", source),
                other => panic!("expected syntax error for {:?}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_template_reusable() {
        let template: Template = "{{.Target}}".parse().unwrap();
        assert_eq!(template.render(&endpoint("a", 1)), "a");
        assert_eq!(template.render(&endpoint("b", 2)), "b");
    }
}
