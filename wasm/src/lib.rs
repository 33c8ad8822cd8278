use nodegraph_format::config::{ParameterStyle, parse_config};
use nodegraph_format::ir::GraphDocument;
use nodegraph_format::{FormatOptions, format_document};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphFormatOptions {
    keep_still: Option<String>,
    #[serde(default)]
    ignore: Vec<String>,
    #[serde(default)]
    only: Vec<String>,
    style: Option<ParameterStyle>,
    /// Same shape as the CLI config file.
    config: Option<serde_json::Value>,
}

fn build_format_options(options: GraphFormatOptions) -> Result<FormatOptions, String> {
    let config = match options.config {
        Some(raw) => parse_config(&raw.to_string()).map_err(|error| error.to_string())?,
        None => Default::default(),
    };

    Ok(FormatOptions {
        config: config.formatter,
        keep_still: options.keep_still,
        ignore: options.ignore,
        only: options.only,
        style: options.style,
    })
}

/// Formats the parameters of `root` inside a JSON graph document and returns
/// the document with updated positions.
#[wasm_bindgen]
pub fn format_graph_json(
    document: &str,
    root: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<GraphFormatOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        GraphFormatOptions::default()
    };

    let format_options = build_format_options(options).map_err(|error| JsValue::from_str(&error))?;
    let (graph, _) = format_document(document, root, &format_options)
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    serde_json::to_string(&GraphDocument::from_graph(&graph))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use nodegraph_format::config::ParameterStyle;
    use nodegraph_format::format_document;
    use nodegraph_format::ir::GraphDocument;

    use crate::{GraphFormatOptions, build_format_options};

    const DOCUMENT: &str = r#"{
        "nodes": [
            {"name": "Root", "x": 400, "y": 0, "width": 100, "height": 80,
             "pins": [{"name": "in", "direction": "input"}]},
            {"name": "A", "width": 100, "height": 80,
             "pins": [{"name": "out", "direction": "output"}]}
        ],
        "links": [{"from": "A.out", "to": "Root.in"}]
    }"#;

    #[test]
    fn options_merge_config_and_style() {
        let options: GraphFormatOptions = serde_json::from_str(
            r#"{"style": "helixing", "ignore": ["A"], "config": {"parameter": {"paddingX": 10}}}"#,
        )
        .unwrap();
        let options = build_format_options(options).unwrap();
        assert_eq!(options.style, Some(ParameterStyle::Helixing));
        assert_eq!(options.ignore, vec!["A".to_string()]);
        assert_eq!(options.config.padding_x, 10.0);
    }

    #[test]
    fn formats_document_round_trip() {
        let options = build_format_options(GraphFormatOptions::default()).unwrap();
        let (graph, _) = format_document(DOCUMENT, "Root", &options).unwrap();
        let document = GraphDocument::from_graph(&graph);
        let a = document.nodes.iter().find(|node| node.name == "A").unwrap();
        assert_eq!((a.x, a.y), (260.0, 0.0));
    }
}
