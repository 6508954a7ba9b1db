//! Typed layout options.
//!
//! Options are stored per node in a [`PropertyMap`]. Keys are [`Property`] constants that
//! carry their id, default value and value check; reading an unset key yields its default.

use crate::error::{Error, ParseOptionError, Result};
use crate::model::{LayoutGraph, NodeLabel};
use orca_graph::{GraphError, NodeId};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const LAYERED_ALGORITHM_ID: &str = "orca.layered";
pub const FIXED_ALGORITHM_ID: &str = "orca.fixed";

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseOptionError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
                $(
                    if normalized == $text {
                        return Ok($name::$variant);
                    }
                )+
                Err(ParseOptionError {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

option_enum! {
    /// How a container's descendants take part in layout.
    HierarchyHandling as "hierarchy handling" {
        /// Use the parent's resolved value (`SeparateChildren` on the layout root).
        #[default]
        Inherit => "INHERIT",
        /// Lay out the container's nested containers in the same algorithm run.
        IncludeChildren => "INCLUDE_CHILDREN",
        /// Lay out each nested container in its own run.
        SeparateChildren => "SEPARATE_CHILDREN",
    }
}

option_enum! {
    /// Main flow direction of a layered layout.
    Direction as "direction" {
        #[default]
        Undefined => "UNDEFINED",
        Right => "RIGHT",
        Left => "LEFT",
        Down => "DOWN",
        Up => "UP",
    }
}

impl Direction {
    /// `Undefined` lays out like `Right`.
    pub fn resolved(self) -> Direction {
        match self {
            Direction::Undefined => Direction::Right,
            d => d,
        }
    }

    /// Whether layers advance along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self.resolved(), Direction::Right | Direction::Left)
    }
}

option_enum! {
    CycleBreakingStrategy as "cycle breaking strategy" {
        #[default]
        Greedy => "GREEDY",
        DepthFirst => "DEPTH_FIRST",
        ModelOrder => "MODEL_ORDER",
        Interactive => "INTERACTIVE",
    }
}

option_enum! {
    /// How strongly the ordering phase follows model (creation) order.
    OrderingStrategy as "model order strategy" {
        #[default]
        None => "NONE",
        NodesAndEdges => "NODES_AND_EDGES",
        PreferEdges => "PREFER_EDGES",
        PreferNodes => "PREFER_NODES",
    }
}

/// A stored option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Float(f64),
    Unsigned(u32),
    HierarchyHandling(HierarchyHandling),
    Direction(Direction),
    CycleBreaking(CycleBreakingStrategy),
    Ordering(OrderingStrategy),
}

/// Conversion between a typed option value and its stored form.
pub trait OptionValue: Clone {
    fn into_value(self) -> PropertyValue;
    fn from_value(value: &PropertyValue) -> Option<Self>;
}

macro_rules! impl_option_value {
    ($ty:ty, $variant:ident) => {
        impl OptionValue for $ty {
            fn into_value(self) -> PropertyValue {
                PropertyValue::$variant(self)
            }

            fn from_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_option_value!(String, String);
impl_option_value!(f64, Float);
impl_option_value!(u32, Unsigned);
impl_option_value!(HierarchyHandling, HierarchyHandling);
impl_option_value!(Direction, Direction);
impl_option_value!(CycleBreakingStrategy, CycleBreaking);
impl_option_value!(OrderingStrategy, Ordering);

type Check<T> = fn(&T) -> std::result::Result<(), &'static str>;

/// A typed option key.
pub struct Property<T> {
    id: &'static str,
    default: fn() -> T,
    check: Option<Check<T>>,
}

impl<T> Property<T> {
    pub const fn new(id: &'static str, default: fn() -> T) -> Self {
        Self {
            id,
            default,
            check: None,
        }
    }

    pub const fn checked(id: &'static str, default: fn() -> T, check: Check<T>) -> Self {
        Self {
            id,
            default,
            check: Some(check),
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }

    pub fn validate(&self, value: &T) -> Result<()> {
        match self.check {
            Some(check) => check(value).map_err(|reason| Error::InvalidOptionValue {
                key: self.id,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&self.id).finish()
    }
}

fn non_negative_finite(v: &f64) -> std::result::Result<(), &'static str> {
    if !v.is_finite() {
        return Err("must be finite");
    }
    if *v < 0.0 {
        return Err("must not be negative");
    }
    Ok(())
}

fn at_least_one(v: &u32) -> std::result::Result<(), &'static str> {
    if *v == 0 {
        return Err("must be at least 1");
    }
    Ok(())
}

fn non_empty(v: &String) -> std::result::Result<(), &'static str> {
    if v.trim().is_empty() {
        return Err("must not be empty");
    }
    Ok(())
}

/// Options understood by the driver and by every algorithm.
pub struct CoreOptions;

impl CoreOptions {
    pub const ALGORITHM: Property<String> =
        Property::checked("orca.algorithm", || LAYERED_ALGORITHM_ID.to_string(), non_empty);
    pub const HIERARCHY_HANDLING: Property<HierarchyHandling> =
        Property::new("orca.hierarchyHandling", HierarchyHandling::default);
    pub const DIRECTION: Property<Direction> = Property::new("orca.direction", Direction::default);
    pub const PADDING: Property<f64> = Property::checked("orca.padding", || 12.0, non_negative_finite);
    pub const SPACING_NODE_NODE: Property<f64> =
        Property::checked("orca.spacing.nodeNode", || 20.0, non_negative_finite);
}

/// Options of the layered algorithm.
pub struct LayeredOptions;

impl LayeredOptions {
    pub const SPACING_NODE_NODE_BETWEEN_LAYERS: Property<f64> = Property::checked(
        "orca.layered.spacing.nodeNodeBetweenLayers",
        || 20.0,
        non_negative_finite,
    );
    pub const CYCLE_BREAKING_STRATEGY: Property<CycleBreakingStrategy> = Property::new(
        "orca.layered.cycleBreaking.strategy",
        CycleBreakingStrategy::default,
    );
    pub const CONSIDER_MODEL_ORDER_STRATEGY: Property<OrderingStrategy> = Property::new(
        "orca.layered.considerModelOrder.strategy",
        OrderingStrategy::default,
    );
    pub const THOROUGHNESS: Property<u32> =
        Property::checked("orca.layered.thoroughness", || 7, at_least_one);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    values: FxHashMap<&'static str, PropertyValue>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: OptionValue>(&mut self, key: &Property<T>, value: T) -> Result<()> {
        key.validate(&value)?;
        self.values.insert(key.id(), value.into_value());
        Ok(())
    }

    pub fn get<T: OptionValue>(&self, key: &Property<T>) -> T {
        self.values
            .get(key.id())
            .and_then(T::from_value)
            .unwrap_or_else(|| key.default_value())
    }

    pub fn has<T: OptionValue>(&self, key: &Property<T>) -> bool {
        self.values.contains_key(key.id())
    }

    pub fn remove<T: OptionValue>(&mut self, key: &Property<T>) -> Option<T> {
        self.values.remove(key.id()).and_then(|v| T::from_value(&v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Sets an option on `node`. The value is checked against the key's constraints first.
pub fn set_property<T: OptionValue>(
    graph: &mut LayoutGraph,
    node: NodeId,
    key: &Property<T>,
    value: T,
) -> Result<()> {
    let label = graph
        .node_mut(node)
        .ok_or(Error::Graph(GraphError::UnknownNode { node }))?;
    label.set(key, value)
}

/// Reads an option of `node`, falling back to the key's default when it is unset.
pub fn get_property<T: OptionValue>(
    graph: &LayoutGraph,
    node: NodeId,
    key: &Property<T>,
) -> Result<T> {
    let label = graph
        .node(node)
        .ok_or(Error::Graph(GraphError::UnknownNode { node }))?;
    Ok(label.get(key))
}

/// Options of one container, resolved once per layout call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeConfig {
    pub node: NodeId,
    pub algorithm: String,
    /// Never `Inherit`.
    pub hierarchy_handling: HierarchyHandling,
    pub direction: Direction,
    pub padding: f64,
    pub spacing_node_node: f64,
    pub spacing_between_layers: f64,
    pub cycle_breaking: CycleBreakingStrategy,
    pub ordering: OrderingStrategy,
    pub thoroughness: u32,
}

impl NodeConfig {
    /// `inherited` is the parent's resolved hierarchy handling, or `None` for the layout root.
    pub fn resolve(node: NodeId, label: &NodeLabel, inherited: Option<HierarchyHandling>) -> Self {
        let hierarchy_handling = match label.get(&CoreOptions::HIERARCHY_HANDLING) {
            HierarchyHandling::Inherit => {
                inherited.unwrap_or(HierarchyHandling::SeparateChildren)
            }
            h => h,
        };
        Self {
            node,
            algorithm: label.get(&CoreOptions::ALGORITHM),
            hierarchy_handling,
            direction: label.get(&CoreOptions::DIRECTION),
            padding: label.get(&CoreOptions::PADDING),
            spacing_node_node: label.get(&CoreOptions::SPACING_NODE_NODE),
            spacing_between_layers: label.get(&LayeredOptions::SPACING_NODE_NODE_BETWEEN_LAYERS),
            cycle_breaking: label.get(&LayeredOptions::CYCLE_BREAKING_STRATEGY),
            ordering: label.get(&LayeredOptions::CONSIDER_MODEL_ORDER_STRATEGY),
            thoroughness: label.get(&LayeredOptions::THOROUGHNESS),
        }
    }

    pub fn includes_children(&self) -> bool {
        self.hierarchy_handling == HierarchyHandling::IncludeChildren
    }
}
