//! 券商歷史K線接入
pub mod gateway;
pub mod groww;

pub use gateway::BrokerGateway;
pub use groww::GrowwGateway;

#[cfg(test)]
pub use gateway::MockBrokerGateway;
