//! Structural comparison of symbol dumps.
//!
//! Two documents are equal when their element trees match: same element names, same
//! attribute sets regardless of order, same trimmed text, and the same children in the same
//! order. Formatting whitespace does not matter.

use std::{collections::BTreeMap, fmt};

use crate::{verify::xml::XmlNode, Result};

/// One difference between an expected and an actual document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDifference {
    /// Location, e.g. `/symbols/methods/method[0]/scope[1]`
    pub path: String,
    /// What differs
    pub message: String,
}

impl fmt::Display for XmlDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Compare two XML documents structurally.
///
/// Returns an empty list if they are equivalent.
///
/// # Errors
/// Returns [`crate::Error::Error`] if either document is not well-formed.
///
/// # Examples
///
/// ```rust
/// use symscope::verify::diff_xml;
///
/// let differences = diff_xml(
///     r#"<scope startOffset="0x0" endOffset="0x8"/>"#,
///     r#"<scope endOffset="0x8"   startOffset="0x0"></scope>"#,
/// )?;
/// assert!(differences.is_empty());
///
/// let differences = diff_xml(r#"<local il_index="0"/>"#, r#"<local il_index="1"/>"#)?;
/// assert_eq!(differences[0].to_string(), r#"/local: attribute il_index: expected "0", found "1""#);
/// # Ok::<(), symscope::Error>(())
/// ```
pub fn diff_xml(expected: &str, actual: &str) -> Result<Vec<XmlDifference>> {
    let expected = XmlNode::parse(expected)?;
    let actual = XmlNode::parse(actual)?;

    let mut differences = Vec::new();
    if expected.name == actual.name {
        diff_node(&expected, &actual, &format!("/{}", expected.name), &mut differences);
    } else {
        differences.push(XmlDifference {
            path: "/".to_string(),
            message: format!(
                "root element: expected <{}>, found <{}>",
                expected.name, actual.name
            ),
        });
    }
    Ok(differences)
}

/// Assert that two symbol dumps are structurally equal.
///
/// # Panics
/// Panics listing every difference, followed by the actual document, if they are not
/// equal or either is not well-formed.
#[track_caller]
pub fn assert_symbols_eq(expected: &str, actual: &str) {
    match diff_xml(expected, actual) {
        Ok(differences) if differences.is_empty() => {}
        Ok(differences) => {
            let report: Vec<String> = differences.iter().map(ToString::to_string).collect();
            panic!(
                "symbols differ:\n  {}\n\nactual:\n{}",
                report.join("\n  "),
                actual
            );
        }
        Err(e) => panic!("symbols could not be compared: {e}\n\nactual:\n{actual}"),
    }
}

fn diff_node(expected: &XmlNode, actual: &XmlNode, path: &str, out: &mut Vec<XmlDifference>) {
    let report = |out: &mut Vec<XmlDifference>, message: String| {
        out.push(XmlDifference {
            path: path.to_string(),
            message,
        });
    };

    let expected_attributes: BTreeMap<&str, &str> = expected
        .attributes
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let actual_attributes: BTreeMap<&str, &str> = actual
        .attributes
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    for (key, value) in &expected_attributes {
        match actual_attributes.get(key) {
            None => report(out, format!("missing attribute {key}=\"{value}\"")),
            Some(found) if found != value => report(
                out,
                format!("attribute {key}: expected \"{value}\", found \"{found}\""),
            ),
            Some(_) => {}
        }
    }
    for (key, value) in &actual_attributes {
        if !expected_attributes.contains_key(key) {
            report(out, format!("unexpected attribute {key}=\"{value}\""));
        }
    }

    if expected.text != actual.text {
        report(
            out,
            format!("text: expected {:?}, found {:?}", expected.text, actual.text),
        );
    }

    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (index, (e, a)) in expected.children.iter().zip(&actual.children).enumerate() {
        let position = seen.entry(e.name.as_str()).or_insert(0);
        let child_path = format!("{path}/{}[{}]", e.name, *position);
        *position += 1;

        if e.name == a.name {
            diff_node(e, a, &child_path, out);
        } else {
            report(
                out,
                format!("child #{index}: expected <{}>, found <{}>", e.name, a.name),
            );
        }
    }

    for missing in expected.children.iter().skip(actual.children.len()) {
        report(out, format!("missing child <{}>", missing.name));
    }
    for extra in actual.children.iter().skip(expected.children.len()) {
        report(out, format!("unexpected child <{}>", extra.name));
    }
}
