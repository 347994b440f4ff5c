pub mod company;
pub mod job;
pub mod location;
pub mod salary;

pub use company::Company;
pub use job::{ExtraData, Job, JobCategory, JobType, NewJob};
pub use location::Location;
pub use salary::{Currency, Salary, SalaryPeriod};
