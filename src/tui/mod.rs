pub mod dispatch_form;
pub mod footer;
pub mod header;
pub mod jobs;
pub mod logs;
pub mod menu;
pub mod prs;
pub mod render;
pub mod rows;
pub mod runs;
pub mod spinner;
pub mod startup;
pub mod workflows;
