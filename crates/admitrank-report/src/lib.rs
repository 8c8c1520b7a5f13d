//! admitrank-report: self-contained HTML renderings of admitrank reports.

pub mod html;

pub use html::{
    generate_evaluation_html, generate_recommendation_html, write_evaluation_html,
    write_recommendation_html,
};
