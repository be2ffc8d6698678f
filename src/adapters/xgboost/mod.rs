//! XGBoost adapter: Implementation of `Classifier` for XGBoost JSON models.
//!
//! Reads the JSON document written by `XGBClassifier.save_model("model.json")`
//! and evaluates the tree ensemble natively. Only what a binary classifier needs
//! is parsed; unknown fields are ignored.
//!
//! # Supported models
//!
//! - Booster: `gbtree`
//! - Objective: `binary:logistic` (probabilities) or `binary:hinge` (labels only)
//!
//! # Evaluation
//!
//! XGBoost stores split thresholds as `f32` and casts inputs to `f32` before
//! comparing, so comparisons here do the same. A sample goes left when
//! `x < split_condition`; NaN follows the node's default direction.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

use crate::domain::{FeatureSchema, FeatureVector, Label, FEATURE_COUNT};
use crate::ports::{sigmoid, Classifier, ModelError};

// =============================================================================
// JSON document
// =============================================================================

fn deserialize_base_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    // Seen in the wild: 0.5, "5E-1", "[5E-1]", [0.5]
    let mut cur = Value::deserialize(deserializer)?;
    loop {
        match cur {
            Value::Number(n) => {
                return n
                    .as_f64()
                    .ok_or_else(|| SerdeError::custom("invalid base_score number"));
            }
            Value::String(s) => {
                let t = s.trim();
                if let Ok(f) = t.parse::<f64>() {
                    return Ok(f);
                }
                if let Some(inner) = t.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                    if let Ok(f) = inner.trim().parse::<f64>() {
                        return Ok(f);
                    }
                }
                return Err(SerdeError::custom(format!(
                    "cannot parse base_score from string: {s}"
                )));
            }
            Value::Array(arr) => {
                cur = arr
                    .into_iter()
                    .next()
                    .ok_or_else(|| SerdeError::custom("empty base_score array"))?;
            }
            _ => {
                return Err(SerdeError::custom(
                    "base_score must be number, string, or array",
                ));
            }
        }
    }
}

/// `default_left` is a list of 0/1 in XGBoost 2.x and of booleans in 1.x.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct TreeParam {
    #[serde_as(as = "DisplayFromStr")]
    num_nodes: usize,
}

#[derive(Debug, Deserialize)]
struct TreeJson {
    tree_param: TreeParam,
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    #[serde(default)]
    default_left: Vec<Flag>,
    /// 0 = numeric, 1 = categorical. Absent before XGBoost 1.6.
    #[serde(default)]
    split_type: Vec<i32>,
    #[serde(default)]
    categories_nodes: Vec<i32>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct GbTreeModelParam {
    #[serde_as(as = "DisplayFromStr")]
    num_trees: usize,
}

#[derive(Debug, Deserialize)]
struct GbTreeModel {
    gbtree_model_param: GbTreeModelParam,
    trees: Vec<TreeJson>,
    #[serde(default)]
    tree_info: Vec<i32>,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveJson {
    name: String,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    #[serde(deserialize_with = "deserialize_base_score")]
    base_score: f64,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    num_class: i64,
    #[serde_as(as = "DisplayFromStr")]
    num_feature: usize,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    objective: ObjectiveJson,
    learner_model_param: LearnerModelParam,
}

#[derive(Debug, Deserialize)]
struct XgbModelJson {
    #[serde(default)]
    version: Vec<u32>,
    learner: Learner,
}

// =============================================================================
// Native representation
// =============================================================================

/// Objective, which decides how the margin is turned into an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XgbObjective {
    /// `binary:logistic`: margin → sigmoid → probability
    BinaryLogistic,
    /// `binary:hinge`: margin > 0 → class 1, no probability
    BinaryHinge,
}

impl XgbObjective {
    fn parse(name: &str) -> Result<Self, ModelError> {
        match name {
            "binary:logistic" => Ok(Self::BinaryLogistic),
            "binary:hinge" => Ok(Self::BinaryHinge),
            other => Err(ModelError::Unsupported(format!(
                "objective {other} (expected binary:logistic or binary:hinge)"
            ))),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BinaryLogistic => "binary:logistic",
            Self::BinaryHinge => "binary:hinge",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    /// Child indices; `left == usize::MAX` marks a leaf.
    left: usize,
    right: usize,
    feature: usize,
    /// Split threshold for internal nodes, leaf value for leaves.
    value: f32,
    default_left: bool,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left == usize::MAX
    }
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_json(index: usize, tree: TreeJson, n_features: usize) -> Result<Self, ModelError> {
        let n = tree.tree_param.num_nodes;
        let malformed = |what: &str| ModelError::Malformed(format!("tree {index}: {what}"));

        if n == 0 {
            return Err(malformed("no nodes"));
        }
        if tree.left_children.len() != n
            || tree.right_children.len() != n
            || tree.split_indices.len() != n
            || tree.split_conditions.len() != n
        {
            return Err(malformed("node arrays do not match num_nodes"));
        }
        if !tree.default_left.is_empty() && tree.default_left.len() != n {
            return Err(malformed("default_left does not match num_nodes"));
        }
        if !tree.split_type.is_empty() && tree.split_type.len() != n {
            return Err(malformed("split_type does not match num_nodes"));
        }
        // Categorical splits test set membership, not `x < cond`.
        if let Some(node) = tree.split_type.iter().position(|&t| t != 0) {
            return Err(ModelError::Unsupported(format!(
                "tree {index}: node {node} is a categorical split"
            )));
        }
        if !tree.categories_nodes.is_empty() {
            return Err(ModelError::Unsupported(format!(
                "tree {index}: categorical splits on nodes {:?}",
                tree.categories_nodes
            )));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = (tree.left_children[i], tree.right_children[i]);
            let default_left = tree.default_left.get(i).is_some_and(|f| f.is_set());
            let value = tree.split_conditions[i];

            if l == -1 {
                if !value.is_finite() {
                    return Err(malformed(&format!("node {i} has a non-finite leaf value")));
                }
                nodes.push(Node {
                    left: usize::MAX,
                    right: usize::MAX,
                    feature: 0,
                    value,
                    default_left,
                });
                continue;
            }

            // Children are always allocated after their parent; this also rules out cycles.
            let child = |c: i32| -> Result<usize, ModelError> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| malformed(&format!("node {i} has invalid child {c}")))
            };
            let feature = usize::try_from(tree.split_indices[i])
                .ok()
                .filter(|&f| f < n_features)
                .ok_or_else(|| {
                    malformed(&format!(
                        "node {i} splits on feature {} (model has {n_features})",
                        tree.split_indices[i]
                    ))
                })?;

            nodes.push(Node {
                left: child(l)?,
                right: child(r)?,
                feature,
                value,
                default_left,
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, x: &[f64]) -> f32 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.value;
            }
            let v = x[node.feature];
            let go_left = if v.is_nan() {
                node.default_left
            } else {
                (v as f32) < node.value
            };
            idx = if go_left { node.left } else { node.right };
        }
    }
}

/// Gradient-boosted tree ensemble for binary classification.
#[derive(Debug, Clone)]
pub struct XgbClassifier {
    objective: XgbObjective,
    base_margin: f64,
    trees: Vec<Tree>,
    feature_names: Vec<String>,
    version: Vec<u32>,
}

impl XgbClassifier {
    /// Build a classifier from a parsed XGBoost JSON document.
    ///
    /// # Errors
    /// Returns `ModelError` if the document is not a supported binary gbtree
    /// model or its columns disagree with the feature schema.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        let doc: XgbModelJson = serde_json::from_value(value)
            .map_err(|e| ModelError::Malformed(format!("XGBoost JSON: {e}")))?;
        let learner = doc.learner;

        let objective = XgbObjective::parse(&learner.objective.name)?;

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelError::Unsupported(format!(
                "booster {} (expected gbtree)",
                learner.gradient_booster.name
            )));
        }
        if learner.learner_model_param.num_class > 1 {
            return Err(ModelError::Unsupported(format!(
                "{} classes (expected a binary model)",
                learner.learner_model_param.num_class
            )));
        }

        let schema = FeatureSchema::current();
        let n_features = learner.learner_model_param.num_feature;
        if !learner.feature_names.is_empty() {
            schema
                .check_columns(&learner.feature_names)
                .map_err(|source| ModelError::SchemaMismatch {
                    schema: schema.version(),
                    source,
                })?;
        }
        if n_features != FEATURE_COUNT {
            return Err(ModelError::FeatureCount {
                expected: FEATURE_COUNT,
                found: n_features,
            });
        }
        if learner.feature_names.is_empty() {
            tracing::warn!(
                "Model declares no feature names; column order against {} is unverified",
                schema.version()
            );
        }

        let base_score = learner.learner_model_param.base_score;
        let base_margin = match objective {
            XgbObjective::BinaryLogistic => {
                if !(base_score > 0.0 && base_score < 1.0) {
                    return Err(ModelError::Malformed(format!(
                        "base_score {base_score} outside (0, 1) for binary:logistic"
                    )));
                }
                (base_score / (1.0 - base_score)).ln()
            }
            XgbObjective::BinaryHinge => base_score,
        };

        let booster = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelError::Malformed("gradient_booster has no model".into()))?;
        let booster: GbTreeModel = serde_json::from_value(booster)
            .map_err(|e| ModelError::Malformed(format!("gbtree model: {e}")))?;

        if booster.gbtree_model_param.num_trees != booster.trees.len() {
            return Err(ModelError::Malformed(format!(
                "num_trees is {} but {} trees are present",
                booster.gbtree_model_param.num_trees,
                booster.trees.len()
            )));
        }
        if booster.tree_info.iter().any(|&group| group != 0) {
            return Err(ModelError::Unsupported("multi-output tree groups".into()));
        }

        let trees = booster
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_json(i, t, n_features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            objective,
            base_margin,
            trees,
            feature_names: learner.feature_names,
            version: doc.version,
        })
    }

    #[must_use]
    pub fn objective(&self) -> XgbObjective {
        self.objective
    }

    #[must_use]
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Column names the model was trained with (empty if not recorded).
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Raw ensemble output before the objective's transform.
    #[must_use]
    pub fn margin(&self, features: &FeatureVector) -> f64 {
        let x = features.as_slice();
        let sum: f32 = self.trees.iter().map(|t| t.leaf_value(x)).sum();
        self.base_margin + f64::from(sum)
    }
}

impl Classifier for XgbClassifier {
    fn describe(&self) -> String {
        let version = self
            .version
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".");
        format!(
            "XGBoost {} ({} trees, {}, saved by xgboost {})",
            self.objective.name(),
            self.trees.len(),
            if self.feature_names.is_empty() {
                "unnamed columns"
            } else {
                "named columns"
            },
            if version.is_empty() { "?" } else { &version },
        )
    }

    fn predict(&self, features: &FeatureVector) -> Result<Label, ModelError> {
        let margin = self.margin(features);
        let positive = match self.objective {
            XgbObjective::BinaryLogistic => sigmoid(margin) > 0.5,
            XgbObjective::BinaryHinge => margin > 0.0,
        };
        Ok(if positive {
            Label::Fibrosis
        } else {
            Label::NoFibrosis
        })
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<[f64; 2]>, ModelError> {
        match self.objective {
            XgbObjective::BinaryLogistic => {
                let p = sigmoid(self.margin(features));
                Ok(Some([1.0 - p, p]))
            }
            XgbObjective::BinaryHinge => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Feature;
    use serde_json::json;

    fn stump(feature: i64, threshold: f32, left: f32, right: f32) -> Value {
        json!({
            "tree_param": {"num_nodes": "3", "num_feature": "15", "num_deleted": "0", "size_leaf_vector": "1"},
            "id": 0,
            "left_children": [1, -1, -1],
            "right_children": [2, -1, -1],
            "parents": [2147483647, 0, 0],
            "split_indices": [feature, 0, 0],
            "split_conditions": [threshold, left, right],
            "split_type": [0, 0, 0],
            "default_left": [1, 0, 0],
            "base_weights": [0.0, left, right],
            "loss_changes": [1.0, 0.0, 0.0],
            "sum_hessian": [10.0, 5.0, 5.0],
            "categories": [], "categories_nodes": [], "categories_segments": [], "categories_sizes": []
        })
    }

    fn model_json(objective: &str, base_score: Value, trees: Vec<Value>, named: bool) -> Value {
        let names: Vec<&str> = if named {
            FeatureSchema::current().column_names()
        } else {
            Vec::new()
        };
        json!({
            "version": [2, 1, 3],
            "learner": {
                "attributes": {},
                "feature_names": names,
                "feature_types": [],
                "gradient_booster": {
                    "name": "gbtree",
                    "model": {
                        "gbtree_model_param": {"num_trees": trees.len().to_string(), "num_parallel_tree": "1"},
                        "iteration_indptr": [0, trees.len()],
                        "tree_info": vec![0; trees.len()],
                        "trees": trees
                    }
                },
                "learner_model_param": {
                    "base_score": base_score,
                    "boost_from_average": "1",
                    "num_class": "0",
                    "num_feature": "15",
                    "num_target": "1"
                },
                "objective": {"name": objective, "reg_loss_param": {"scale_pos_weight": "1"}}
            }
        })
    }

    fn vector_with(feature: Feature, value: f64) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[FeatureSchema::current().position(feature)] = value;
        FeatureVector::from_ordered(values)
    }

    #[test]
    fn test_base_score_formats() {
        for raw in [json!(0.5), json!("5E-1"), json!("[5E-1]"), json!([0.5])] {
            let doc = model_json("binary:logistic", raw, vec![stump(0, 25.0, 0.0, 0.0)], true);
            let model = XgbClassifier::from_value(doc).expect("parse");
            assert!(model.base_margin.abs() < 1e-12);
        }
    }

    #[test]
    fn test_logistic_margin_and_probability() {
        // BMI < 25 -> -1.0, else +1.0; base_score 0.5 -> base margin 0
        let doc = model_json("binary:logistic", json!("5E-1"), vec![stump(0, 25.0, -1.0, 1.0)], true);
        let model = XgbClassifier::from_value(doc).expect("parse");

        let lean = vector_with(Feature::Bmi, 20.0);
        assert!((model.margin(&lean) + 1.0).abs() < 1e-6);
        assert_eq!(model.predict(&lean).unwrap(), Label::NoFibrosis);
        let [p0, p1] = model.predict_proba(&lean).unwrap().expect("logistic has proba");
        assert!((p1 - sigmoid(-1.0)).abs() < 1e-6);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);

        let obese = vector_with(Feature::Bmi, 31.0);
        assert_eq!(model.predict(&obese).unwrap(), Label::Fibrosis);
    }

    #[test]
    fn test_threshold_is_strict_less_than() {
        let doc = model_json("binary:logistic", json!(0.5), vec![stump(0, 25.0, -1.0, 1.0)], true);
        let model = XgbClassifier::from_value(doc).expect("parse");
        // Exactly on the threshold goes right.
        assert_eq!(model.predict(&vector_with(Feature::Bmi, 25.0)).unwrap(), Label::Fibrosis);
    }

    #[test]
    fn test_nan_follows_default_direction() {
        let doc = model_json("binary:logistic", json!(0.5), vec![stump(0, 25.0, -1.0, 1.0)], true);
        let model = XgbClassifier::from_value(doc).expect("parse");
        let missing = vector_with(Feature::Bmi, f64::NAN);
        assert_eq!(model.predict(&missing).unwrap(), Label::NoFibrosis);
    }

    #[test]
    fn test_hinge_has_no_probability() {
        let doc = model_json("binary:hinge", json!(0.0), vec![stump(9, 60.0, -1.0, 1.0)], true);
        let model = XgbClassifier::from_value(doc).expect("parse");
        let high_cap = vector_with(Feature::CapMedian, 80.0);
        assert_eq!(model.predict(&high_cap).unwrap(), Label::Fibrosis);
        assert!(model.predict_proba(&high_cap).unwrap().is_none());
    }

    #[test]
    fn test_rejects_unsupported_objective() {
        let doc = model_json("reg:squarederror", json!(0.5), vec![stump(0, 1.0, 0.0, 0.0)], true);
        let err = XgbClassifier::from_value(doc).expect_err("regression model");
        assert!(matches!(err, ModelError::Unsupported(_)));
    }

    #[test]
    fn test_rejects_reordered_columns() {
        let mut doc = model_json("binary:logistic", json!(0.5), vec![stump(0, 1.0, 0.0, 0.0)], true);
        let names = doc["learner"]["feature_names"].as_array_mut().unwrap();
        names.swap(2, 3);
        let err = XgbClassifier::from_value(doc).expect_err("reordered");
        assert!(matches!(err, ModelError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_unnamed_columns_require_matching_count() {
        let doc = model_json("binary:logistic", json!(0.5), vec![stump(0, 1.0, 0.0, 0.0)], false);
        assert!(XgbClassifier::from_value(doc).is_ok());

        let mut doc = model_json("binary:logistic", json!(0.5), vec![stump(0, 1.0, 0.0, 0.0)], false);
        doc["learner"]["learner_model_param"]["num_feature"] = json!("9");
        let err = XgbClassifier::from_value(doc).expect_err("9 features");
        assert!(matches!(err, ModelError::FeatureCount { expected: 15, found: 9 }));
    }

    #[test]
    fn test_rejects_cyclic_tree() {
        let mut tree = stump(0, 1.0, 0.0, 0.0);
        tree["left_children"] = json!([1, 0, -1]);
        tree["right_children"] = json!([2, 0, -1]);
        let doc = model_json("binary:logistic", json!(0.5), vec![tree], true);
        let err = XgbClassifier::from_value(doc).expect_err("cycle");
        assert!(matches!(err, ModelError::Malformed(_)));
    }

    #[test]
    fn test_rejects_out_of_range_split_feature() {
        let doc = model_json("binary:logistic", json!(0.5), vec![stump(15, 1.0, 0.0, 0.0)], true);
        assert!(matches!(
            XgbClassifier::from_value(doc),
            Err(ModelError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_categorical_splits() {
        let mut tree = stump(1, 25.0, -1.0, 1.0);
        tree["split_type"] = json!([1, 0, 0]);
        tree["categories"] = json!([0, 1]);
        tree["categories_nodes"] = json!([0]);
        tree["categories_segments"] = json!([0]);
        tree["categories_sizes"] = json!([2]);
        let doc = model_json("binary:logistic", json!(0.5), vec![tree], true);
        let err = XgbClassifier::from_value(doc).expect_err("categorical split");
        assert!(matches!(err, ModelError::Unsupported(_)));

        // Older saves without split_type are numeric-only.
        let mut tree = stump(0, 25.0, -1.0, 1.0);
        tree.as_object_mut().unwrap().remove("split_type");
        let doc = model_json("binary:logistic", json!(0.5), vec![tree], true);
        assert!(XgbClassifier::from_value(doc).is_ok());
    }

    #[test]
    fn test_accepts_boolean_default_left() {
        let mut tree = stump(0, 25.0, -1.0, 1.0);
        tree["default_left"] = json!([false, false, false]);
        let doc = model_json("binary:logistic", json!(0.5), vec![tree], true);
        let model = XgbClassifier::from_value(doc).expect("1.x style flags");
        let missing = vector_with(Feature::Bmi, f64::NAN);
        assert_eq!(model.predict(&missing).unwrap(), Label::Fibrosis);
    }
}
