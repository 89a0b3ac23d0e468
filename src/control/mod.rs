//! Actuator control.  One actuator: the reward lid.

pub mod lid;
