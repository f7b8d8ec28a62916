//! SNAP graph documents: a tree of named processing nodes, each with an
//! operator, a flat parameter block, and a reference to its upstream node.
//! Supports stage excision with relinking and typed placeholder substitution.
use std::collections::BTreeMap;
use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Error, Result};

pub const SUBSET_NODE: &str = "Subset";
pub const MASK_NODE: &str = "Land-Sea-Mask";
pub const SPECKLE_NODE: &str = "Speckle-Filter";
pub const TERRAIN_NODE: &str = "Terrain-Correction";
pub const DB_NODE: &str = "LinearToFromdB";

/// One `<node>` of a processing graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub operator: String,
    /// Upstream node id (`<sourceProduct refid=...>`); `None` for the reader.
    pub source: Option<String>,
    /// Flat operator parameters in document order.
    pub params: Vec<(String, String)>,
}

/// A parsed graph document. Nodes keep document order; connectivity is the
/// per-node `source` reference, so removal is a relink rather than index
/// arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDocument {
    pub id: String,
    pub version: String,
    pub nodes: Vec<GraphNode>,
}

fn attr(element: &BytesStart, name: &str) -> Result<Option<String>> {
    match element
        .try_get_attribute(name)
        .map_err(quick_xml::Error::from)?
    {
        Some(attribute) => Ok(Some(attribute.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

impl GraphDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut doc = GraphDocument {
            id: "Graph".to_string(),
            version: "1.0".to_string(),
            nodes: Vec::new(),
        };
        let mut node: Option<GraphNode> = None;
        let mut in_parameters = false;
        let mut open: Vec<String> = Vec::new();
        let mut pending_param: Option<(String, String)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(element) => {
                    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                    match name.as_str() {
                        "graph" => {
                            if let Some(id) = attr(&element, "id")? {
                                doc.id = id;
                            }
                        }
                        "node" => {
                            let id = attr(&element, "id")?.ok_or_else(|| {
                                Error::MalformedTemplate("node without id attribute".to_string())
                            })?;
                            node = Some(GraphNode {
                                id,
                                operator: String::new(),
                                source: None,
                                params: Vec::new(),
                            });
                        }
                        "parameters" if node.is_some() => in_parameters = true,
                        "sourceProduct" => {
                            if let (Some(n), Some(refid)) =
                                (node.as_mut(), attr(&element, "refid")?)
                            {
                                n.source = Some(refid);
                            }
                        }
                        _ if in_parameters => pending_param = Some((name.clone(), String::new())),
                        _ => {}
                    }
                    open.push(name);
                }
                Event::Empty(element) => {
                    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                    match name.as_str() {
                        "sourceProduct" => {
                            if let (Some(n), Some(refid)) =
                                (node.as_mut(), attr(&element, "refid")?)
                            {
                                n.source = Some(refid);
                            }
                        }
                        _ if in_parameters => {
                            if let Some(n) = node.as_mut() {
                                n.params.push((name, String::new()));
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(text) => {
                    let value = text.unescape()?.into_owned();
                    match open.last().map(String::as_str) {
                        Some("version") => doc.version = value,
                        Some("operator") => {
                            if let Some(n) = node.as_mut() {
                                n.operator = value;
                            }
                        }
                        _ => {
                            if let Some(param) = pending_param.as_mut() {
                                param.1 = value;
                            }
                        }
                    }
                }
                Event::End(element) => {
                    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                    match name.as_str() {
                        "node" => {
                            if let Some(n) = node.take() {
                                doc.nodes.push(n);
                            }
                            in_parameters = false;
                        }
                        "parameters" => in_parameters = false,
                        _ => {
                            if in_parameters {
                                if let (Some(n), Some(param)) =
                                    (node.as_mut(), pending_param.take())
                                {
                                    if param.0 == name {
                                        n.params.push(param);
                                    }
                                }
                            }
                        }
                    }
                    open.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if doc.nodes.is_empty() {
            return Err(Error::MalformedTemplate(
                "graph template contains no nodes".to_string(),
            ));
        }
        Ok(doc)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub fn param(&self, node_id: &str, name: &str) -> Option<&str> {
        self.node(node_id)?
            .params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_param(&mut self, node_id: &str, name: &str, value: &str) -> Result<()> {
        let node = self.node_mut(node_id).ok_or_else(|| Error::MalformedTemplate(
            format!("graph has no node '{node_id}'"),
        ))?;
        match node.params.iter_mut().find(|(param, _)| param == name) {
            Some(param) => param.1 = value.to_string(),
            None => node.params.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    /// Remove the node `id` and relink every node that referenced it to the
    /// removed node's own upstream source, preserving pipeline connectivity.
    /// Returns false when no such node exists (the stage was never in the
    /// template), which is not an error.
    pub fn excise(&mut self, id: &str) -> bool {
        let Some(position) = self.nodes.iter().position(|node| node.id == id) else {
            return false;
        };
        let removed = self.nodes.remove(position);
        for node in &mut self.nodes {
            if node.source.as_deref() == Some(id) {
                node.source = removed.source.clone();
            }
        }
        true
    }

    /// Substitute `${name}` placeholders in every parameter value. Unknown
    /// placeholder names and known-but-unsupplied placeholders are both
    /// errors; a disabled stage must be excised before substitution so its
    /// placeholders are gone from the working copy.
    pub fn substitute(&mut self, subs: &Substitutions) -> Result<()> {
        for node in &mut self.nodes {
            for (_, value) in &mut node.params {
                if value.contains("${") {
                    *value = render(value, subs)?;
                }
            }
        }
        Ok(())
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut graph = BytesStart::new("graph");
        graph.push_attribute(("id", self.id.as_str()));
        writer.write_event(Event::Start(graph))?;

        writer.write_event(Event::Start(BytesStart::new("version")))?;
        writer.write_event(Event::Text(BytesText::new(&self.version)))?;
        writer.write_event(Event::End(BytesEnd::new("version")))?;

        for node in &self.nodes {
            let mut element = BytesStart::new("node");
            element.push_attribute(("id", node.id.as_str()));
            writer.write_event(Event::Start(element))?;

            writer.write_event(Event::Start(BytesStart::new("operator")))?;
            writer.write_event(Event::Text(BytesText::new(&node.operator)))?;
            writer.write_event(Event::End(BytesEnd::new("operator")))?;

            match &node.source {
                Some(source) => {
                    writer.write_event(Event::Start(BytesStart::new("sources")))?;
                    let mut product = BytesStart::new("sourceProduct");
                    product.push_attribute(("refid", source.as_str()));
                    writer.write_event(Event::Empty(product))?;
                    writer.write_event(Event::End(BytesEnd::new("sources")))?;
                }
                None => writer.write_event(Event::Empty(BytesStart::new("sources")))?,
            }

            let mut parameters = BytesStart::new("parameters");
            parameters.push_attribute(("class", "com.bc.ceres.binding.dom.XppDomElement"));
            writer.write_event(Event::Start(parameters))?;
            for (name, value) in &node.params {
                if value.is_empty() {
                    writer.write_event(Event::Empty(BytesStart::new(name.as_str())))?;
                } else {
                    writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
                    writer.write_event(Event::Text(BytesText::new(value)))?;
                    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                }
            }
            writer.write_event(Event::End(BytesEnd::new("parameters")))?;

            writer.write_event(Event::End(BytesEnd::new("node")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("graph")))?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| Error::MalformedTemplate(e.to_string()))
    }
}

/// The placeholders a graph template may carry. Keeping them enumerated means
/// a template/parameter mismatch fails with a named placeholder instead of a
/// silently unsubstituted string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Placeholder {
    /// `${manifest_path}` — the scene's `manifest.safe` file.
    ManifestPath,
    /// `${output_path}` — write target base path, without extension.
    OutputPath,
    /// `${pol_upper}` — upper-case polarisation code.
    PolarisationUpper,
    /// `${mask_type}` — Land-Sea-Mask `landMask` flag.
    MaskType,
    /// `${sigma_band}` / `${gamma_band}` / `${beta_band}` — calibration one-hots.
    SigmaBand,
    GammaBand,
    BetaBand,
    /// `${band_type}` — calibrated band name prefix (`Sigma0` etc).
    BandType,
    /// `${aoi_wkt}` — subset polygon; only present when an AOI is configured.
    AoiWkt,
}

impl Placeholder {
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::ManifestPath => "manifest_path",
            Placeholder::OutputPath => "output_path",
            Placeholder::PolarisationUpper => "pol_upper",
            Placeholder::MaskType => "mask_type",
            Placeholder::SigmaBand => "sigma_band",
            Placeholder::GammaBand => "gamma_band",
            Placeholder::BetaBand => "beta_band",
            Placeholder::BandType => "band_type",
            Placeholder::AoiWkt => "aoi_wkt",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "manifest_path" => Placeholder::ManifestPath,
            "output_path" => Placeholder::OutputPath,
            "pol_upper" => Placeholder::PolarisationUpper,
            "mask_type" => Placeholder::MaskType,
            "sigma_band" => Placeholder::SigmaBand,
            "gamma_band" => Placeholder::GammaBand,
            "beta_band" => Placeholder::BetaBand,
            "band_type" => Placeholder::BandType,
            "aoi_wkt" => Placeholder::AoiWkt,
            _ => return None,
        })
    }
}

/// Typed placeholder → value map.
#[derive(Debug, Clone, Default)]
pub struct Substitutions(BTreeMap<Placeholder, String>);

impl Substitutions {
    pub fn set(&mut self, key: Placeholder, value: impl Into<String>) -> &mut Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn get(&self, key: Placeholder) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }
}

fn render(input: &str, subs: &Substitutions) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            Error::MalformedTemplate(format!("unterminated placeholder in '{input}'"))
        })?;
        let name = &after[..end];
        let key = Placeholder::from_name(name).ok_or_else(|| Error::UnknownPlaceholder {
            name: name.to_string(),
        })?;
        let value = subs.get(key).ok_or_else(|| Error::UnresolvedPlaceholder {
            name: name.to_string(),
        })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
