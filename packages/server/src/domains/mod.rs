pub mod expert_search;
