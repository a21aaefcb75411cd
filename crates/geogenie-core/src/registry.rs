//! Static table of the supported operations
//!
//! Adding an operation means one entry here plus one mapping in the executor.

use crate::error::UnknownOperation;
use crate::models::{AlgorithmSpec, DistanceUnit, NumericRange, OpName, ParamDefault, ParamKind, ParamSpec};

const INPUT: ParamSpec = ParamSpec {
    required: true,
    aliases: &["layer", "input_layer", "layer_id", "source", "source_layer"],
    ..ParamSpec::new("input", ParamKind::LayerRef, "INPUT", "Id of the layer to process")
};

const OVERLAY: ParamSpec = ParamSpec {
    required: true,
    aliases: &["overlay_layer", "mask", "clip_layer", "boundary", "second_layer"],
    ..ParamSpec::new("overlay", ParamKind::LayerRef, "OVERLAY", "Id of the polygon layer to overlay")
};

static BUFFER_PARAMS: [ParamSpec; 6] = [
    INPUT,
    ParamSpec {
        required: true,
        unit: Some(DistanceUnit::Meters),
        range: Some(NumericRange::above(0.0, 1_000_000.0)),
        aliases: &["buffer_distance", "radius", "dist"],
        ..ParamSpec::new(
            "distance",
            ParamKind::Numeric,
            "DISTANCE",
            "Buffer distance; a number in meters or a string with a unit such as \"0.5 km\"",
        )
    },
    ParamSpec {
        range: Some(NumericRange::inclusive(1.0, 64.0)),
        default: Some(ParamDefault::Number(5.0)),
        whole: true,
        aliases: &["segs", "quadrant_segments"],
        ..ParamSpec::new("segments", ParamKind::Numeric, "SEGMENTS", "Segments used to approximate curves")
    },
    ParamSpec {
        default: Some(ParamDefault::Text("round")),
        options: &["round", "flat", "square"],
        aliases: &["end_cap", "cap_style"],
        ..ParamSpec::new("end_cap_style", ParamKind::Enum, "END_CAP_STYLE", "Shape of buffered line ends")
    },
    ParamSpec {
        default: Some(ParamDefault::Text("round")),
        options: &["round", "miter", "bevel"],
        aliases: &["join"],
        ..ParamSpec::new("join_style", ParamKind::Enum, "JOIN_STYLE", "Shape of buffered corners")
    },
    ParamSpec {
        default: Some(ParamDefault::Number(2.0)),
        range: Some(NumericRange::inclusive(1.0, 100.0)),
        aliases: &["miter"],
        ..ParamSpec::new("miter_limit", ParamKind::Numeric, "MITER_LIMIT", "Limit for miter joins")
    },
];

static CLIP_PARAMS: [ParamSpec; 2] = [INPUT, OVERLAY];

static REPROJECT_PARAMS: [ParamSpec; 2] = [
    INPUT,
    ParamSpec {
        required: true,
        aliases: &["crs", "target", "to_crs", "epsg", "destination_crs"],
        ..ParamSpec::new("target_crs", ParamKind::CrsCode, "TARGET_CRS", "Target CRS such as \"EPSG:3857\"")
    },
];

static DISSOLVE_PARAMS: [ParamSpec; 2] = [
    INPUT,
    ParamSpec {
        layer_param: Some("input"),
        aliases: &["dissolve_field", "by", "group_by", "attribute"],
        ..ParamSpec::new(
            "field",
            ParamKind::FieldRef,
            "FIELD",
            "Attribute of the input layer to group by; omit to merge all features",
        )
    },
];

static INTERSECT_PARAMS: [ParamSpec; 2] = [INPUT, OVERLAY];

static ALGORITHMS: [AlgorithmSpec; 5] = [
    AlgorithmSpec {
        op: OpName::Buffer,
        title: "Buffer",
        description: "Create buffer zones around features at a given distance",
        backend_id: "native:buffer",
        parameters: &BUFFER_PARAMS,
    },
    AlgorithmSpec {
        op: OpName::Clip,
        title: "Clip",
        description: "Cut the input layer to the extent of the overlay polygons",
        backend_id: "native:clip",
        parameters: &CLIP_PARAMS,
    },
    AlgorithmSpec {
        op: OpName::Reproject,
        title: "Reproject layer",
        description: "Transform the input layer into another coordinate reference system",
        backend_id: "native:reprojectlayer",
        parameters: &REPROJECT_PARAMS,
    },
    AlgorithmSpec {
        op: OpName::Dissolve,
        title: "Dissolve",
        description: "Merge features, optionally grouped by an attribute field",
        backend_id: "native:dissolve",
        parameters: &DISSOLVE_PARAMS,
    },
    AlgorithmSpec {
        op: OpName::Intersect,
        title: "Intersection",
        description: "Keep the parts of input features that overlap the overlay polygons",
        backend_id: "native:intersection",
        parameters: &INTERSECT_PARAMS,
    },
];

/// Process-wide registry of operation schemas
#[derive(Debug, Clone, Copy, Default)]
pub struct AlgorithmRegistry;

impl AlgorithmRegistry {
    /// Look up an operation by name
    pub fn lookup(name: &str) -> Result<&'static AlgorithmSpec, UnknownOperation> {
        OpName::parse(name)
            .map(Self::spec)
            .ok_or_else(|| UnknownOperation { name: name.trim().to_string() })
    }

    pub fn spec(op: OpName) -> &'static AlgorithmSpec {
        match op {
            OpName::Buffer => &ALGORITHMS[0],
            OpName::Clip => &ALGORITHMS[1],
            OpName::Reproject => &ALGORITHMS[2],
            OpName::Dissolve => &ALGORITHMS[3],
            OpName::Intersect => &ALGORITHMS[4],
        }
    }

    /// Every operation, in a fixed order
    pub fn all() -> &'static [AlgorithmSpec] {
        &ALGORITHMS
    }
}
