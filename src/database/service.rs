//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::gateway::StoreGateway;
use crate::database::{
    ActivityRepository, DatabasePool, ParticipationRepository, StudentRepository, UserRepository,
};
use crate::utils::errors::Result;

/// Owns one repository per entity, all sharing a single gateway
#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub gateway: StoreGateway,
    pub activities: ActivityRepository,
    pub students: StudentRepository,
    pub participations: ParticipationRepository,
    pub users: UserRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        let gateway = StoreGateway::new(pool);
        Self {
            activities: ActivityRepository::new(gateway.clone()),
            students: StudentRepository::new(gateway.clone()),
            participations: ParticipationRepository::new(gateway.clone()),
            users: UserRepository::new(gateway.clone()),
            gateway,
        }
    }

    /// Check that the store still answers
    pub async fn health_check(&self) -> Result<()> {
        crate::database::health_check(self.gateway.pool()).await
    }
}
