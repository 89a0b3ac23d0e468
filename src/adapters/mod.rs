//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to              |
//! |------------|----------------|--------------------------|
//! | `hardware` | InputPort      | ESP32 GPIO (perch, button)|
//! |            | LidServoPort   | ESP32 LEDC PWM           |
//! |            | IndicatorPort  | ESP32 GPIO (status LED)  |
//! |            | ResetPort      | `esp_restart`            |
//! | `log_sink` | EventSink      | Serial log output        |
//! | `nvs`      | StoragePort    | NVS / in-memory store    |
//! |            | ConfigPort     |                          |
//! | `time`     | ClockPort      | ESP32 system timer       |
//! |            | DelayNs        |                          |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
