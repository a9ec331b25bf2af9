//! Builders for the platform's serialized expression graphs.
//!
//! A graph is a flat map of numbered nodes plus the id of the result node.
//! Nodes refer to each other through `valueReference`, so a value used twice
//! (the request geometry, typically) is only serialized once.

use super::{
    CLOUD_COVER_PROPERTY, COLLECTION_ID, INDEX_BAND, ImageQuery, MAX_PIXELS, NIR_BAND, RED_BAND,
    SCALE_METERS,
};
use crate::models::Polygon;
use serde_json::{Map, Value, json};

const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

#[derive(Debug, Default)]
pub struct ExpressionGraph {
    values: Map<String, Value>,
    next_id: usize,
}

impl ExpressionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: impl Into<Value>) -> Value {
        json!({ "constantValue": value.into() })
    }

    pub fn argument(name: &str) -> Value {
        json!({ "argumentReference": name })
    }

    pub fn invoke(&mut self, function: &str, arguments: Vec<(&str, Value)>) -> Value {
        let arguments: Map<String, Value> = arguments
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        let node = json!({
            "functionInvocationValue": {
                "functionName": function,
                "arguments": arguments,
            }
        });
        let id = self.push(node);
        json!({ "valueReference": id })
    }

    /// One-argument function whose body is an already-built node.
    pub fn function(&mut self, argument_name: &str, body: Value) -> Value {
        let body = self.node_id(body);
        json!({
            "functionDefinitionValue": {
                "argumentNames": [argument_name],
                "body": body,
            }
        })
    }

    pub fn finish(mut self, result: Value) -> Value {
        let result = self.node_id(result);
        json!({
            "result": result,
            "values": self.values,
        })
    }

    fn push(&mut self, node: Value) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        self.values.insert(id.clone(), node);
        id
    }

    fn node_id(&mut self, value: Value) -> String {
        match value.get("valueReference").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => self.push(value),
        }
    }
}

fn geometry(graph: &mut ExpressionGraph, polygon: &Polygon) -> Value {
    graph.invoke(
        "GeometryConstructors.Polygon",
        vec![("coordinates", ExpressionGraph::constant(polygon.coordinates.clone()))],
    )
}

/// Catalog images intersecting the geometry, inside the date range, under the cloud cutoff.
fn filtered_collection(graph: &mut ExpressionGraph, query: &ImageQuery, geom: &Value) -> Value {
    let collection = graph.invoke(
        "ImageCollection.load",
        vec![("id", ExpressionGraph::constant(COLLECTION_ID))],
    );

    let bounds = graph.invoke(
        "Filter.intersects",
        vec![
            ("leftField", ExpressionGraph::constant(".all")),
            ("rightValue", geom.clone()),
        ],
    );
    let collection = graph.invoke(
        "Collection.filter",
        vec![("collection", collection), ("filter", bounds)],
    );

    let range = graph.invoke(
        "DateRange",
        vec![
            ("start", ExpressionGraph::constant(query.dates.start_string())),
            ("end", ExpressionGraph::constant(query.dates.end_string())),
        ],
    );
    let dates = graph.invoke(
        "Filter.dateRangeContains",
        vec![
            ("leftValue", range),
            ("rightField", ExpressionGraph::constant("system:time_start")),
        ],
    );
    let collection = graph.invoke(
        "Collection.filter",
        vec![("collection", collection), ("filter", dates)],
    );

    let clouds = graph.invoke(
        "Filter.lessThan",
        vec![
            ("leftField", ExpressionGraph::constant(CLOUD_COVER_PROPERTY)),
            (
                "rightValue",
                ExpressionGraph::constant(query.cloud_cover_threshold),
            ),
        ],
    );
    graph.invoke(
        "Collection.filter",
        vec![("collection", collection), ("filter", clouds)],
    )
}

pub fn collection_size(query: &ImageQuery) -> Value {
    let mut graph = ExpressionGraph::new();
    let geom = geometry(&mut graph, &query.geometry);
    let collection = filtered_collection(&mut graph, query, &geom);
    let size = graph.invoke("Collection.size", vec![("collection", collection)]);
    graph.finish(size)
}

/// Region mean/min/max of the median NDVI composite, keyed `NDVI_mean`, `NDVI_min`, `NDVI_max`.
pub fn index_statistics(query: &ImageQuery) -> Value {
    let mut graph = ExpressionGraph::new();
    let geom = geometry(&mut graph, &query.geometry);
    let collection = filtered_collection(&mut graph, query, &geom);

    let difference = graph.invoke(
        "Image.normalizedDifference",
        vec![
            ("input", ExpressionGraph::argument(MAPPING_VAR)),
            (
                "bandNames",
                ExpressionGraph::constant(json!([NIR_BAND, RED_BAND])),
            ),
        ],
    );
    let index = graph.invoke(
        "Image.rename",
        vec![
            ("input", difference),
            ("names", ExpressionGraph::constant(json!([INDEX_BAND]))),
        ],
    );
    let add_index = graph.function(MAPPING_VAR, index);
    let with_index = graph.invoke(
        "Collection.map",
        vec![("collection", collection), ("baseAlgorithm", add_index)],
    );

    let median = graph.invoke("Reducer.median", Vec::new());
    let composite = graph.invoke(
        "ImageCollection.reduce",
        vec![("collection", with_index), ("reducer", median)],
    );
    let composite = graph.invoke(
        "Image.rename",
        vec![
            ("input", composite),
            ("names", ExpressionGraph::constant(json!([INDEX_BAND]))),
        ],
    );
    let composite = graph.invoke(
        "Image.clip",
        vec![("input", composite), ("geometry", geom.clone())],
    );

    let mean = graph.invoke("Reducer.mean", Vec::new());
    let min = graph.invoke("Reducer.min", Vec::new());
    let max = graph.invoke("Reducer.max", Vec::new());
    let mean_min = graph.invoke(
        "Reducer.combine",
        vec![
            ("reducer1", mean),
            ("reducer2", min),
            ("sharedInputs", ExpressionGraph::constant(true)),
        ],
    );
    let reducer = graph.invoke(
        "Reducer.combine",
        vec![
            ("reducer1", mean_min),
            ("reducer2", max),
            ("sharedInputs", ExpressionGraph::constant(true)),
        ],
    );

    let stats = graph.invoke(
        "Image.reduceRegion",
        vec![
            ("image", composite),
            ("reducer", reducer),
            ("geometry", geom),
            ("scale", ExpressionGraph::constant(SCALE_METERS)),
            ("maxPixels", ExpressionGraph::constant(MAX_PIXELS)),
        ],
    );
    graph.finish(stats)
}

pub fn area(polygon: &Polygon) -> Value {
    let mut graph = ExpressionGraph::new();
    let geom = geometry(&mut graph, polygon);
    let area = graph.invoke(
        "Geometry.area",
        vec![
            ("geometry", geom),
            ("maxError", ExpressionGraph::constant(1)),
        ],
    );
    graph.finish(area)
}
