//! 集成测试公共设施
#![allow(dead_code)]

use async_trait::async_trait;
use guard_proxy::Result;
use guard_proxy::classifier::{Classification, Classify};
use guard_proxy::config::InternalModel;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashMap;
use std::sync::Mutex;

/// 内存SQLite + 真实迁移
///
/// 连接池固定单连接：内存库按连接隔离，多连接会各见各的空库
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("连接内存数据库失败");
    Migrator::up(&db, None).await.expect("迁移失败");
    db
}

/// 按模型ID返回预置分类结果的桩分类器，记录调用顺序
pub struct MapClassifier {
    responses: HashMap<String, (Vec<String>, Vec<f64>)>,
    calls: Mutex<Vec<String>>,
}

impl MapClassifier {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_response(mut self, model: &str, labels: &[&str], probabilities: &[f64]) -> Self {
        self.responses.insert(
            model.to_string(),
            (
                labels.iter().map(|s| (*s).to_string()).collect(),
                probabilities.to_vec(),
            ),
        );
        self
    }

    /// 按调用顺序返回被分类的模型ID
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Classify for MapClassifier {
    async fn classify(&self, model: &InternalModel, _text: &str) -> Result<Classification> {
        self.calls.lock().unwrap().push(model.model.to_string());
        let (labels, probabilities) = self
            .responses
            .get(model.model.as_str())
            .cloned()
            .expect("桩分类器未配置该模型");
        Ok(Classification {
            labels,
            probabilities,
            model_id: model.model.to_string(),
        })
    }
}
