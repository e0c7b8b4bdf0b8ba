//! Data sources: what to record, and how to aggregate it.

use abm_model::{Agent, Model};

use crate::error::{CollectError, CollectResult};
use crate::value::Value;

// ── Aggregate ─────────────────────────────────────────────────────────────────

/// Reduction applied across all (filtered) agents on a collection tick.
///
/// Every built-in aggregate fails on a `Null` input — a variant lacking the
/// field must be excluded with a filter predicate, never silently skipped.
pub enum Aggregate {
    Sum,
    Mean,
    Min,
    Max,
    Count,
    Custom {
        name: String,
        f:    Box<dyn Fn(&[Value]) -> Value + Send>,
    },
}

impl Aggregate {
    /// Short name used as the column-name prefix.
    pub fn name(&self) -> &str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Mean => "mean",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Count => "count",
            Aggregate::Custom { name, .. } => name,
        }
    }

    /// Reduce the gathered values to one cell.
    pub fn apply(&self, values: &[Value]) -> CollectResult<Value> {
        if let Some(pos) = values.iter().position(Value::is_null) {
            return Err(CollectError::Aggregation(format!(
                "{} over a null value at row {pos}; exclude the variant with a filter",
                self.name()
            )));
        }
        match self {
            Aggregate::Count => Ok(Value::Int(values.len() as i64)),
            Aggregate::Custom { f, .. } => Ok(f(values)),
            Aggregate::Sum => {
                if values.iter().all(|v| matches!(v, Value::Int(_))) {
                    Ok(Value::Int(values.iter().filter_map(Value::as_i64).sum()))
                } else {
                    Ok(Value::Float(self.numeric(values)?.into_iter().sum()))
                }
            }
            Aggregate::Mean => {
                let nums = self.numeric(values)?;
                if nums.is_empty() {
                    return Err(CollectError::Aggregation(
                        "mean of an empty selection".into(),
                    ));
                }
                Ok(Value::Float(nums.iter().sum::<f64>() / nums.len() as f64))
            }
            Aggregate::Min | Aggregate::Max => {
                let nums = self.numeric(values)?;
                let picked = match self {
                    Aggregate::Min => nums.into_iter().fold(f64::INFINITY, f64::min),
                    _ => nums.into_iter().fold(f64::NEG_INFINITY, f64::max),
                };
                if picked.is_finite() {
                    // Preserve integer columns.
                    if values.iter().all(|v| matches!(v, Value::Int(_))) {
                        Ok(Value::Int(picked as i64))
                    } else {
                        Ok(Value::Float(picked))
                    }
                } else {
                    Err(CollectError::Aggregation(format!(
                        "{} of an empty selection",
                        self.name()
                    )))
                }
            }
        }
    }

    fn numeric(&self, values: &[Value]) -> CollectResult<Vec<f64>> {
        values
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    CollectError::Aggregation(format!(
                        "{} over non-numeric value {v:?}",
                        self.name()
                    ))
                })
            })
            .collect()
    }
}

// ── AgentSource ───────────────────────────────────────────────────────────────

pub(crate) struct NamedPred<A> {
    pub name: String,
    pub pred: Box<dyn Fn(&A) -> bool + Send>,
}

/// One `adata` entry: a named accessor, optionally aggregated, optionally
/// over a filtered subset.
pub struct AgentSource<A> {
    pub(crate) name:   String,
    pub(crate) get:    Box<dyn Fn(&A) -> Value + Send>,
    pub(crate) agg:    Option<Aggregate>,
    pub(crate) filter: Option<NamedPred<A>>,
}

impl<A: Agent> AgentSource<A> {
    /// One row per agent per collection tick.
    pub fn per_agent(
        name: impl Into<String>,
        get:  impl Fn(&A) -> Value + Send + 'static,
    ) -> Self {
        Self {
            name:   name.into(),
            get:    Box::new(get),
            agg:    None,
            filter: None,
        }
    }

    /// One row per collection tick: `agg` across all agents.
    pub fn aggregate(
        name: impl Into<String>,
        get:  impl Fn(&A) -> Value + Send + 'static,
        agg:  Aggregate,
    ) -> Self {
        Self {
            name:   name.into(),
            get:    Box::new(get),
            agg:    Some(agg),
            filter: None,
        }
    }

    /// One row per collection tick: `agg` across the agents matching `pred`.
    pub fn aggregate_filtered(
        name:      impl Into<String>,
        get:       impl Fn(&A) -> Value + Send + 'static,
        agg:       Aggregate,
        pred_name: impl Into<String>,
        pred:      impl Fn(&A) -> bool + Send + 'static,
    ) -> Self {
        Self {
            name:   name.into(),
            get:    Box::new(get),
            agg:    Some(agg),
            filter: Some(NamedPred { name: pred_name.into(), pred: Box::new(pred) }),
        }
    }

    pub fn is_aggregated(&self) -> bool {
        self.agg.is_some()
    }

    /// Apply the accessor to one agent (used by row-oriented dumps).
    pub fn value_of(&self, agent: &A) -> Value {
        (self.get)(agent)
    }

    /// The column name under the naming contract: `field`, `agg_field`, or
    /// `agg_field_pred`.
    pub fn column_name(&self) -> String {
        match (&self.agg, &self.filter) {
            (None, _) => self.name.clone(),
            (Some(agg), None) => format!("{}_{}", agg.name(), self.name),
            (Some(agg), Some(filter)) => {
                format!("{}_{}_{}", agg.name(), self.name, filter.name)
            }
        }
    }
}

// ── ModelSource ───────────────────────────────────────────────────────────────

/// One `mdata` entry: a named accessor over the whole model.
pub struct ModelSource<A: Agent, S, P> {
    pub(crate) name: String,
    #[allow(clippy::type_complexity)]
    pub(crate) get: Box<dyn Fn(&Model<A, S, P>) -> Value + Send>,
}

impl<A: Agent, S, P> ModelSource<A, S, P> {
    pub fn new(
        name: impl Into<String>,
        get:  impl Fn(&Model<A, S, P>) -> Value + Send + 'static,
    ) -> Self {
        Self { name: name.into(), get: Box::new(get) }
    }

    pub fn column_name(&self) -> &str {
        &self.name
    }
}
