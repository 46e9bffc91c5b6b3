//! Reading SVRL (Schematron Validation Report Language) output.
use crate::validation::rules::{Assertion, Severity};
use crate::validation::{ValidationError, parse_well_formed};
use libxml::{tree::Node, xpath};

pub(crate) const SVRL_NS: &str = "http://purl.oclc.org/dsdl/svrl";

const ROOT_ELEMENT: &str = "schematron-output";
const FAILED_ASSERTS: &str = "//*[local-name()='failed-assert']";
const ASSERT_TEXT: &str = ".//*[local-name()='text']";

/// Extract every `failed-assert` from an SVRL document, in document order.
///
/// Elements are matched by local name so the `svrl` prefix (or its absence)
/// does not matter. A report without failed assertions yields an empty list;
/// output that is not a well-formed SVRL document (a truncated one included)
/// is a [`ValidationError::Transform`].
pub fn parse_failed_asserts(svrl: &str) -> Result<Vec<Assertion>, ValidationError> {
    let doc = parse_well_formed(svrl).map_err(|errors| {
        ValidationError::Transform(format!("failed to parse SVRL: {}", errors.join("; ")))
    })?;
    let Some(root) = doc.get_root_element() else {
        return Err(ValidationError::Transform("SVRL document has no root element".into()));
    };
    if root.get_name() != ROOT_ELEMENT {
        return Err(ValidationError::Transform(format!(
            "expected SVRL root <{ROOT_ELEMENT}>, found <{}>",
            root.get_name()
        )));
    }
    if let Some(ns) = root.get_namespace()
        && ns.get_href() != SVRL_NS
    {
        tracing::debug!(namespace = %ns.get_href(), "SVRL root in unexpected namespace");
    }

    let ctx = xpath::Context::new(&doc)
        .map_err(|e| ValidationError::Transform(format!("XPath context: {e:?}")))?;
    let nodes = ctx
        .evaluate(FAILED_ASSERTS)
        .map_err(|e| ValidationError::Transform(format!("XPath error: {e:?}")))?
        .get_nodes_as_vec();

    nodes
        .iter()
        .map(|node| assertion_from_node(&ctx, node))
        .collect()
}

fn assertion_from_node(ctx: &xpath::Context, node: &Node) -> Result<Assertion, ValidationError> {
    let message = ctx
        .node_evaluate(ASSERT_TEXT, node)
        .map_err(|e| ValidationError::Transform(format!("XPath error: {e:?}")))?
        .get_nodes_as_vec()
        .first()
        .map(|text| text.get_content().trim().to_string())
        .unwrap_or_default();
    let severity = Severity::from_flag(node.get_attribute("flag").as_deref());

    Ok(Assertion {
        severity,
        message,
        id: node.get_attribute("id"),
        location: node.get_attribute("location"),
    })
}
