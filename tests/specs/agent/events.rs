// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process agent against the stub broker over TCP

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wl_adapters::TcpTransport;
use wl_agent::{ActionError, Agent, AgentConfig, AgentStatus, Service, Session, Tick};

use crate::prelude::*;

#[derive(Default)]
struct Echo {
    triggered: bool,
    received: Vec<Value>,
}

#[async_trait]
impl Service for Echo {
    async fn run(&mut self, session: &mut Session) -> Result<Tick, ActionError> {
        if !self.triggered {
            self.triggered = true;
            session.trigger("greet", Some(json!({"who": "world"})), true).await?;
        }
        Ok(Tick::Sleep(Duration::from_millis(200)))
    }

    async fn invoke(
        &mut self,
        action: &str,
        args: &[Value],
        session: &mut Session,
    ) -> Result<(), ActionError> {
        match action {
            "on_greet" => {
                self.received.push(args.first().cloned().unwrap_or(Value::Null));
                let count = session.kv().incr("greetings", 1).await?;
                if count == Some(1) {
                    session.stop();
                }
                Ok(())
            }
            other => Err(ActionError::Unknown(other.to_string())),
        }
    }
}

#[tokio::test]
async fn subscribed_event_round_trips_through_broker() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let stub = StubBroker::new();
    tokio::spawn(stub.clone().serve(listener));

    let config = AgentConfig::from_toml(&format!(
        "name = \"echo\"\n[server]\nport = {port}\n[subscribe]\ngreet = \"on_greet\"\n"
    ))
    .unwrap();
    let transport = TcpTransport::new("127.0.0.1", port);
    let mut agent = Agent::from_config(Echo::default(), Box::new(transport), &config).unwrap();

    let code = tokio::time::timeout(Duration::from_secs(10), agent.main()).await.unwrap();

    assert_eq!(code, 0);
    assert_eq!(agent.status(), AgentStatus::Stopped);
    assert_eq!(agent.service().received, vec![json!({"who": "world"})]);
    assert_eq!(stub.subscriptions(), vec!["greet"]);
    assert_eq!(stub.value(None, "greetings"), Some(json!(1)));
}
