use std::sync::Arc;

use companion_service::CompanionService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CompanionService>,
}
impl AppState {
	pub async fn new(config: companion_config::Config) -> color_eyre::Result<Self> {
		let service = CompanionService::bootstrap(config).await?;

		Ok(Self { service: Arc::new(service) })
	}
}
