// Settings service - MinderGas.nl upload settings and energy contracts
use crate::application::error::DashboardError;
use crate::application::home_server_repository::HomeServerRepository;
use crate::domain::settings::{EnergyContract, MindergasnlSettings};
use std::sync::Arc;

#[derive(Clone)]
pub struct SettingsService {
    repository: Arc<dyn HomeServerRepository>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn HomeServerRepository>) -> Self {
        Self { repository }
    }

    pub async fn mindergasnl(&self) -> Result<MindergasnlSettings, DashboardError> {
        self.repository
            .mindergasnl_settings()
            .await
            .map_err(|e| DashboardError::backend("Instellingen konden niet worden opgehaald", e))
    }

    /// Invalid settings are rejected before the backend is contacted.
    pub async fn save_mindergasnl(
        &self,
        settings: MindergasnlSettings,
    ) -> Result<MindergasnlSettings, DashboardError> {
        settings.validate()?;
        let saved = self
            .repository
            .save_mindergasnl_settings(&settings)
            .await
            .map_err(|e| DashboardError::backend("Instellingen konden niet worden opgeslagen", e))?;
        tracing::info!("Saved MinderGas.nl settings (automatisch uploaden: {})", saved.automatisch_uploaden);
        Ok(saved)
    }

    pub async fn energy_contracts(&self) -> Result<Vec<EnergyContract>, DashboardError> {
        let mut contracts = self
            .repository
            .energy_contracts()
            .await
            .map_err(|e| DashboardError::backend("Energiecontracten konden niet worden opgehaald", e))?;
        contracts.sort_by(|a, b| b.valid_from.cmp(&a.valid_from));
        Ok(contracts)
    }

    pub async fn save_energy_contract(&self, contract: EnergyContract) -> Result<EnergyContract, DashboardError> {
        contract.validate()?;
        let saved = self
            .repository
            .save_energy_contract(&contract.for_backend())
            .await
            .map_err(|e| DashboardError::backend("Energiecontract kon niet worden opgeslagen", e))?;
        tracing::info!("Saved energy contract {:?} from {}", saved.id, saved.valid_from);
        Ok(saved)
    }

    pub async fn delete_energy_contract(&self, id: i64) -> Result<(), DashboardError> {
        self.repository
            .delete_energy_contract(id)
            .await
            .map_err(|e| DashboardError::backend("Energiecontract kon niet worden verwijderd", e))?;
        tracing::info!("Deleted energy contract {}", id);
        Ok(())
    }
}
