use tracing::info;

use crate::core::check_requests::check_requests;
use crate::core::execute::RequestExecutor;
use crate::core::extract::{JsonpathExtractor, VariableExtractor};
use crate::core::resolver::Resolver;
use crate::error::ConfigError;
use crate::models::collection::Collection;
use crate::models::execution_result::ExecutionResult;

/// Runs the requests of a collection one after another.
pub struct Runner {
    executor: RequestExecutor,
    resolver: Resolver,
    env: String,
    extractor: Box<dyn VariableExtractor>,
}

impl Runner {
    pub fn new(executor: RequestExecutor, env: impl Into<String>) -> Self {
        Runner {
            executor,
            resolver: Resolver::new(),
            env: env.into(),
            extractor: Box::new(JsonpathExtractor),
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn VariableExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    /// One result per request, in declaration order.
    ///
    /// Only a bad collection or environment is an error; failing requests are
    /// reported in their results and never stop the run.
    pub async fn run(&mut self, collection: &Collection) -> Result<Vec<ExecutionResult>, ConfigError> {
        check_requests(&collection.requests)?;
        self.resolver.load_environment(collection, &self.env)?;
        info!(
            collection = %collection.name,
            env = %self.env,
            requests = collection.requests.len(),
            "running collection"
        );

        let mut results = Vec::with_capacity(collection.requests.len());
        for request in &collection.requests {
            let result = self.executor.execute(request, &self.resolver).await;
            if result.is_success() {
                self.extractor
                    .extract(request, &result.response, &mut self.resolver);
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.passed).count();
        info!(
            collection = %collection.name,
            passed,
            failed = results.len() - passed,
            "collection finished"
        );
        Ok(results)
    }
}
