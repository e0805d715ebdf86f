//! Wiring of collaborator services into per-category executors.

use std::sync::Arc;

use tracing::warn;

use {donna_config::SchedulingConfig, donna_routing::Category};

use crate::{
    IntegrationExecutor,
    calendar::{CalendarExecutor, CalendarService},
    email::{EmailExecutor, MailService},
    travel::{FlightSearchService, HotelSearchService, TravelExecutor},
};

/// Holds whichever collaborator services the deployment wired up and builds
/// executors on demand.
///
/// Categories without a wired collaborator (and `General`, which never has
/// one) resolve to `None`; the tool router then answers with an
/// "Unknown function" output instead of failing the run.
#[derive(Default)]
pub struct IntegrationRegistry {
    calendar: Option<Arc<dyn CalendarService>>,
    flights: Option<Arc<dyn FlightSearchService>>,
    hotels: Option<Arc<dyn HotelSearchService>>,
    mail: Option<Arc<dyn MailService>>,
    scheduling: SchedulingConfig,
}

impl IntegrationRegistry {
    #[must_use]
    pub fn new(scheduling: SchedulingConfig) -> Self {
        Self {
            scheduling,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_calendar(mut self, service: Arc<dyn CalendarService>) -> Self {
        self.calendar = Some(service);
        self
    }

    #[must_use]
    pub fn with_travel(
        mut self,
        flights: Arc<dyn FlightSearchService>,
        hotels: Arc<dyn HotelSearchService>,
    ) -> Self {
        self.flights = Some(flights);
        self.hotels = Some(hotels);
        self
    }

    #[must_use]
    pub fn with_mail(mut self, service: Arc<dyn MailService>) -> Self {
        self.mail = Some(service);
        self
    }

    /// Build the executor for a category, if its collaborators are wired and
    /// a user id is available for credential lookup.
    #[must_use]
    pub fn executor_for(
        &self,
        category: Category,
        user_id: &str,
    ) -> Option<Box<dyn IntegrationExecutor>> {
        if category == Category::General {
            return None;
        }
        if user_id.is_empty() {
            warn!(%category, "user id required for specialized executors");
            return None;
        }

        match category {
            Category::Schedule | Category::ScheduleEmail => {
                let service = self.calendar.clone()?;
                Some(Box::new(CalendarExecutor::new(
                    service,
                    user_id,
                    self.scheduling.clone(),
                )))
            },
            Category::Travel => {
                let flights = self.flights.clone()?;
                let hotels = self.hotels.clone()?;
                Some(Box::new(TravelExecutor::new(flights, hotels)))
            },
            Category::Email => {
                let service = self.mail.clone()?;
                Some(Box::new(EmailExecutor::new(service, user_id)))
            },
            _ => None,
        }
    }
}
