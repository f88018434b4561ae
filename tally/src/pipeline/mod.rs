pub mod aggregate;
mod job;
mod report;
