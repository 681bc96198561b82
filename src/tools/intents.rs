//! The built-in intent tool descriptors.

use super::{Intent, ParamType, ToolDescriptor, ToolParam};

/// Descriptors in registration order. [`Intent::descriptor`] indexes into this.
pub static DESCRIPTORS: [ToolDescriptor; 4] = [
    ToolDescriptor {
        name: "create_social_draft",
        description: "Creates a draft for a social media post for X, Twitter, Facebook or LinkedIn.",
        intent: Intent::SaveDraft,
        params: &[
            ToolParam {
                name: "content",
                kind: ParamType::String,
                description: "Text of the post.",
                default: None,
            },
            ToolParam {
                name: "platform",
                kind: ParamType::String,
                description: "Target platform, e.g. x, facebook, linkedin.",
                default: Some("x"),
            },
        ],
    },
    ToolDescriptor {
        name: "record_expense",
        description: "Records a financial expense. Call this when the user mentions spending money, buying something, or paying a bill.",
        intent: Intent::RecordExpense,
        params: &[
            ToolParam {
                name: "amount",
                kind: ParamType::Number,
                description: "Amount spent.",
                default: None,
            },
            ToolParam {
                name: "category",
                kind: ParamType::String,
                description: "Spending category, e.g. food, rent, travel.",
                default: None,
            },
            ToolParam {
                name: "description",
                kind: ParamType::String,
                description: "What the money was spent on.",
                default: None,
            },
        ],
    },
    ToolDescriptor {
        name: "create_task",
        description: "Creates a new task or to-do item. Use this when the user wants to remember to do something, especially following up on jobs or social posts.",
        intent: Intent::CreateTask,
        params: &[
            ToolParam {
                name: "title",
                kind: ParamType::String,
                description: "Short task title.",
                default: None,
            },
            ToolParam {
                name: "due_date",
                kind: ParamType::String,
                description: "When the task is due, in the user's words.",
                default: Some("Tomorrow"),
            },
        ],
    },
    ToolDescriptor {
        name: "track_job_application",
        description: "Tracks a new job application. Call this when the user says they applied for a job or found a job they like.",
        intent: Intent::TrackJob,
        params: &[
            ToolParam {
                name: "company",
                kind: ParamType::String,
                description: "Company name.",
                default: None,
            },
            ToolParam {
                name: "role",
                kind: ParamType::String,
                description: "Job title.",
                default: None,
            },
            ToolParam {
                name: "status",
                kind: ParamType::String,
                description: "Application status, e.g. Applied, Interviewing, Saved.",
                default: None,
            },
            ToolParam {
                name: "link",
                kind: ParamType::String,
                description: "Link to the posting.",
                default: Some(""),
            },
            ToolParam {
                name: "salary_range",
                kind: ParamType::String,
                description: "Advertised salary range.",
                default: Some(""),
            },
        ],
    },
];
