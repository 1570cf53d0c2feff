use crate::config::AppConfig;
use crate::services::audit::AuditLogger;
use crate::services::messaging::MessagingProvider;
use crate::store::ReservationStore;

pub struct AppState {
    pub store: ReservationStore,
    pub config: AppConfig,
    pub messaging: Box<dyn MessagingProvider>,
    pub audit: Box<dyn AuditLogger>,
}
