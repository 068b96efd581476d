// Discord commands module.
// Each feature gets its own command file.

pub mod tickets;

pub mod admin;

pub mod moderation;

pub mod tags;

pub mod info;
