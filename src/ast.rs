use serde::{Deserialize, Serialize};

use crate::geometry::Coords;
use crate::value::Scalar;

/// An integer attribute given either literally or as a reference to a
/// single-cardinality integer variable resolved at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntegerOrVariableRef {
    Integer(i64),
    VariableRef(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FloatOrVariableRef {
    Float(f64),
    VariableRef(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringOrVariableRef {
    String(String),
    VariableRef(String),
}

impl From<i64> for IntegerOrVariableRef {
    fn from(value: i64) -> Self {
        IntegerOrVariableRef::Integer(value)
    }
}

impl From<f64> for FloatOrVariableRef {
    fn from(value: f64) -> Self {
        FloatOrVariableRef::Float(value)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RoundingMode {
    SignificantFigures,
    DecimalPlaces,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ToleranceMode {
    #[default]
    Exact,
    Absolute,
    Relative,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MathFunction {
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Asin,
    Acos,
    Atan,
    Atan2,
    Asec,
    Acsc,
    Acot,
    Sinh,
    Cosh,
    Tanh,
    Sech,
    Csch,
    Coth,
    Log,
    Ln,
    Exp,
    Abs,
    Signum,
    Floor,
    Ceil,
    ToDegrees,
    ToRadians,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum StatsFunction {
    #[serde(rename = "mean")]
    #[strum(serialize = "mean")]
    Mean,
    #[serde(rename = "sampleVariance")]
    #[strum(serialize = "sampleVariance")]
    SampleVariance,
    #[serde(rename = "sampleSD")]
    #[strum(serialize = "sampleSD")]
    SampleSd,
    #[serde(rename = "popVariance")]
    #[strum(serialize = "popVariance")]
    PopVariance,
    #[serde(rename = "popSD")]
    #[strum(serialize = "popSD")]
    PopSd,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MathConstantName {
    Pi,
    E,
}

fn default_true() -> bool {
    true
}

/// An already-parsed expression tree node.
///
/// Leaf variants read literals or variables; every other variant owns its
/// ordered operand expressions together with its literal attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expression {
    // Leaves
    BaseValue(Scalar),
    Null,
    #[serde(rename_all = "camelCase")]
    Variable {
        identifier: String,
        #[serde(default)]
        weight_identifier: Option<String>,
    },
    Correct {
        identifier: String,
    },
    Default {
        identifier: String,
    },
    MapResponse {
        identifier: String,
    },
    MapResponsePoint {
        identifier: String,
    },
    RandomInteger {
        min: IntegerOrVariableRef,
        max: IntegerOrVariableRef,
        #[serde(default = "default_step")]
        step: IntegerOrVariableRef,
    },
    RandomFloat {
        min: FloatOrVariableRef,
        max: FloatOrVariableRef,
    },
    MathConstant(MathConstantName),

    // Logical
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Vec<Expression>),
    AnyN {
        min: IntegerOrVariableRef,
        max: IntegerOrVariableRef,
        operands: Vec<Expression>,
    },

    // Relational
    Lt(Vec<Expression>),
    Lte(Vec<Expression>),
    Gt(Vec<Expression>),
    Gte(Vec<Expression>),
    Match(Vec<Expression>),
    #[serde(rename_all = "camelCase")]
    Equal {
        #[serde(default)]
        tolerance_mode: ToleranceMode,
        #[serde(default)]
        tolerance: Vec<FloatOrVariableRef>,
        #[serde(default = "default_true")]
        include_lower_bound: bool,
        #[serde(default = "default_true")]
        include_upper_bound: bool,
        operands: Vec<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    EqualRounded {
        rounding_mode: RoundingMode,
        figures: IntegerOrVariableRef,
        operands: Vec<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    StringMatch {
        case_sensitive: bool,
        #[serde(default)]
        substring: bool,
        operands: Vec<Expression>,
    },
    PatternMatch {
        pattern: StringOrVariableRef,
        operands: Vec<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    Substring {
        #[serde(default = "default_true")]
        case_sensitive: bool,
        operands: Vec<Expression>,
    },
    #[serde(rename = "durationLT")]
    DurationLt(Vec<Expression>),
    #[serde(rename = "durationGTE")]
    DurationGte(Vec<Expression>),

    // Arithmetic
    Sum(Vec<Expression>),
    Product(Vec<Expression>),
    Subtract(Vec<Expression>),
    Divide(Vec<Expression>),
    Power(Vec<Expression>),
    IntegerDivide(Vec<Expression>),
    IntegerModulus(Vec<Expression>),
    IntegerToFloat(Vec<Expression>),
    Truncate(Vec<Expression>),
    Round(Vec<Expression>),
    #[serde(rename_all = "camelCase")]
    RoundTo {
        figures: IntegerOrVariableRef,
        rounding_mode: RoundingMode,
        operands: Vec<Expression>,
    },
    Gcd(Vec<Expression>),
    Lcm(Vec<Expression>),
    Min(Vec<Expression>),
    Max(Vec<Expression>),
    MathOperator {
        name: MathFunction,
        operands: Vec<Expression>,
    },
    StatsOperator {
        name: StatsFunction,
        operands: Vec<Expression>,
    },

    // Containers
    Multiple(Vec<Expression>),
    Ordered(Vec<Expression>),
    ContainerSize(Vec<Expression>),
    IsNull(Vec<Expression>),
    Delete(Vec<Expression>),
    Member(Vec<Expression>),
    Contains(Vec<Expression>),
    Index {
        n: IntegerOrVariableRef,
        operands: Vec<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    Repeat {
        number_repeats: IntegerOrVariableRef,
        operands: Vec<Expression>,
    },
    Random(Vec<Expression>),
    #[serde(rename_all = "camelCase")]
    FieldValue {
        field_identifier: String,
        operands: Vec<Expression>,
    },
    Inside {
        coords: Coords,
        operands: Vec<Expression>,
    },
}

fn default_step() -> IntegerOrVariableRef {
    IntegerOrVariableRef::Integer(1)
}

impl Expression {
    pub fn base_value(value: impl Into<Scalar>) -> Self {
        Expression::BaseValue(value.into())
    }

    pub fn variable(identifier: impl Into<String>) -> Self {
        Expression::Variable {
            identifier: identifier.into(),
            weight_identifier: None,
        }
    }

    pub fn kind(&self) -> ExpressionKind {
        match self {
            Expression::BaseValue(_) => ExpressionKind::BaseValue,
            Expression::Null => ExpressionKind::Null,
            Expression::Variable { .. } => ExpressionKind::Variable,
            Expression::Correct { .. } => ExpressionKind::Correct,
            Expression::Default { .. } => ExpressionKind::Default,
            Expression::MapResponse { .. } => ExpressionKind::MapResponse,
            Expression::MapResponsePoint { .. } => ExpressionKind::MapResponsePoint,
            Expression::RandomInteger { .. } => ExpressionKind::RandomInteger,
            Expression::RandomFloat { .. } => ExpressionKind::RandomFloat,
            Expression::MathConstant(_) => ExpressionKind::MathConstant,
            Expression::And(_) => ExpressionKind::And,
            Expression::Or(_) => ExpressionKind::Or,
            Expression::Not(_) => ExpressionKind::Not,
            Expression::AnyN { .. } => ExpressionKind::AnyN,
            Expression::Lt(_) => ExpressionKind::Lt,
            Expression::Lte(_) => ExpressionKind::Lte,
            Expression::Gt(_) => ExpressionKind::Gt,
            Expression::Gte(_) => ExpressionKind::Gte,
            Expression::Match(_) => ExpressionKind::Match,
            Expression::Equal { .. } => ExpressionKind::Equal,
            Expression::EqualRounded { .. } => ExpressionKind::EqualRounded,
            Expression::StringMatch { .. } => ExpressionKind::StringMatch,
            Expression::PatternMatch { .. } => ExpressionKind::PatternMatch,
            Expression::Substring { .. } => ExpressionKind::Substring,
            Expression::DurationLt(_) => ExpressionKind::DurationLt,
            Expression::DurationGte(_) => ExpressionKind::DurationGte,
            Expression::Sum(_) => ExpressionKind::Sum,
            Expression::Product(_) => ExpressionKind::Product,
            Expression::Subtract(_) => ExpressionKind::Subtract,
            Expression::Divide(_) => ExpressionKind::Divide,
            Expression::Power(_) => ExpressionKind::Power,
            Expression::IntegerDivide(_) => ExpressionKind::IntegerDivide,
            Expression::IntegerModulus(_) => ExpressionKind::IntegerModulus,
            Expression::IntegerToFloat(_) => ExpressionKind::IntegerToFloat,
            Expression::Truncate(_) => ExpressionKind::Truncate,
            Expression::Round(_) => ExpressionKind::Round,
            Expression::RoundTo { .. } => ExpressionKind::RoundTo,
            Expression::Gcd(_) => ExpressionKind::Gcd,
            Expression::Lcm(_) => ExpressionKind::Lcm,
            Expression::Min(_) => ExpressionKind::Min,
            Expression::Max(_) => ExpressionKind::Max,
            Expression::MathOperator { .. } => ExpressionKind::MathOperator,
            Expression::StatsOperator { .. } => ExpressionKind::StatsOperator,
            Expression::Multiple(_) => ExpressionKind::Multiple,
            Expression::Ordered(_) => ExpressionKind::Ordered,
            Expression::ContainerSize(_) => ExpressionKind::ContainerSize,
            Expression::IsNull(_) => ExpressionKind::IsNull,
            Expression::Delete(_) => ExpressionKind::Delete,
            Expression::Member(_) => ExpressionKind::Member,
            Expression::Contains(_) => ExpressionKind::Contains,
            Expression::Index { .. } => ExpressionKind::Index,
            Expression::Repeat { .. } => ExpressionKind::Repeat,
            Expression::Random(_) => ExpressionKind::Random,
            Expression::FieldValue { .. } => ExpressionKind::FieldValue,
            Expression::Inside { .. } => ExpressionKind::Inside,
        }
    }

    /// Child expressions, empty for leaves.
    pub fn operands(&self) -> &[Expression] {
        match self {
            Expression::BaseValue(_)
            | Expression::Null
            | Expression::Variable { .. }
            | Expression::Correct { .. }
            | Expression::Default { .. }
            | Expression::MapResponse { .. }
            | Expression::MapResponsePoint { .. }
            | Expression::RandomInteger { .. }
            | Expression::RandomFloat { .. }
            | Expression::MathConstant(_) => &[],

            Expression::And(operands)
            | Expression::Or(operands)
            | Expression::Not(operands)
            | Expression::Lt(operands)
            | Expression::Lte(operands)
            | Expression::Gt(operands)
            | Expression::Gte(operands)
            | Expression::Match(operands)
            | Expression::DurationLt(operands)
            | Expression::DurationGte(operands)
            | Expression::Sum(operands)
            | Expression::Product(operands)
            | Expression::Subtract(operands)
            | Expression::Divide(operands)
            | Expression::Power(operands)
            | Expression::IntegerDivide(operands)
            | Expression::IntegerModulus(operands)
            | Expression::IntegerToFloat(operands)
            | Expression::Truncate(operands)
            | Expression::Round(operands)
            | Expression::Gcd(operands)
            | Expression::Lcm(operands)
            | Expression::Min(operands)
            | Expression::Max(operands)
            | Expression::Multiple(operands)
            | Expression::Ordered(operands)
            | Expression::ContainerSize(operands)
            | Expression::IsNull(operands)
            | Expression::Delete(operands)
            | Expression::Member(operands)
            | Expression::Contains(operands)
            | Expression::Random(operands) => operands,

            Expression::AnyN { operands, .. }
            | Expression::Equal { operands, .. }
            | Expression::EqualRounded { operands, .. }
            | Expression::StringMatch { operands, .. }
            | Expression::PatternMatch { operands, .. }
            | Expression::Substring { operands, .. }
            | Expression::RoundTo { operands, .. }
            | Expression::MathOperator { operands, .. }
            | Expression::StatsOperator { operands, .. }
            | Expression::Index { operands, .. }
            | Expression::Repeat { operands, .. }
            | Expression::FieldValue { operands, .. }
            | Expression::Inside { operands, .. } => operands,
        }
    }
}

/// Operand count bounds of an expression kind; `max: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "exactly {}", max),
            Some(max) => write!(f, "between {} and {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

/// Identity of an expression, used for binding and in error reports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ExpressionKind {
    BaseValue,
    Null,
    Variable,
    Correct,
    Default,
    MapResponse,
    MapResponsePoint,
    RandomInteger,
    RandomFloat,
    MathConstant,
    And,
    Or,
    Not,
    AnyN,
    Lt,
    Lte,
    Gt,
    Gte,
    Match,
    Equal,
    EqualRounded,
    StringMatch,
    PatternMatch,
    Substring,
    #[serde(rename = "durationLT")]
    #[strum(serialize = "durationLT")]
    DurationLt,
    #[serde(rename = "durationGTE")]
    #[strum(serialize = "durationGTE")]
    DurationGte,
    Sum,
    Product,
    Subtract,
    Divide,
    Power,
    IntegerDivide,
    IntegerModulus,
    IntegerToFloat,
    Truncate,
    Round,
    RoundTo,
    Gcd,
    Lcm,
    Min,
    Max,
    MathOperator,
    StatsOperator,
    Multiple,
    Ordered,
    ContainerSize,
    IsNull,
    Delete,
    Member,
    Contains,
    Index,
    Repeat,
    Random,
    FieldValue,
    Inside,
}

impl ExpressionKind {
    pub fn arity(&self) -> Arity {
        use ExpressionKind::*;
        match self {
            BaseValue | Null | Variable | Correct | Default | MapResponse | MapResponsePoint
            | RandomInteger | RandomFloat | MathConstant => Arity::exactly(0),

            And | Or | AnyN | Sum | Product | Gcd | Lcm | Min | Max | MathOperator | Repeat => {
                Arity::at_least(1)
            }
            Multiple | Ordered => Arity::at_least(0),

            Not | PatternMatch | IntegerToFloat | Truncate | Round | RoundTo | StatsOperator
            | ContainerSize | IsNull | Index | Random | FieldValue | Inside => Arity::exactly(1),

            Lt | Lte | Gt | Gte | Match | Equal | EqualRounded | StringMatch | Substring
            | DurationLt | DurationGte | Subtract | Divide | Power | IntegerDivide
            | IntegerModulus | Delete | Member | Contains => Arity::exactly(2),
        }
    }
}
