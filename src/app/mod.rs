//! Application layer — the hexagonal core of the node.
//!
//! | Module       | Role                                             |
//! |--------------|--------------------------------------------------|
//! | `ports`      | Traits the core drives (modem, MCU, sensor, sink)|
//! | `events`     | Structured events emitted through `EventSink`    |
//! | `dispatcher` | Drains stack events, one handler per kind        |
//! | `service`    | One super-loop iteration per `step`              |

pub mod dispatcher;
pub mod events;
pub mod ports;
pub mod service;
