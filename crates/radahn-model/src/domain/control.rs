use serde::{Deserialize, Serialize};

/// Envelope understood by the simulation command endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub header: MessageHeader,
    pub cmds: Vec<ControlCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub format: String,
    pub generator: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlCommand {
    StopSimulation,
}

impl MessageHeader {
    pub fn new(generator: impl Into<String>) -> Self {
        Self {
            format: "radahn".to_string(),
            generator: generator.into(),
            version: "0.1".to_string(),
        }
    }
}

impl ControlMessage {
    /// A message carrying a single `STOP_SIMULATION` instruction.
    pub fn stop_simulation(generator: impl Into<String>) -> Self {
        Self {
            header: MessageHeader::new(generator),
            cmds: vec![ControlCommand::StopSimulation],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_command_wire_shape() {
        let msg = ControlMessage::stop_simulation("radahn-agentd");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "header": {"format": "radahn", "generator": "radahn-agentd", "version": "0.1"},
                "cmds": [{"type": "STOP_SIMULATION"}]
            })
        );
    }
}
