mod certificates;
mod cohorts;
mod common;
mod routing;
