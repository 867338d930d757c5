pub use reconciler::{Action, ChallengeReconciler, TXT};
pub use rrset::RRSetRepository;
pub use zone::{longest_suffix_match, subdomain_label, un_fqdn, ZoneResolver};

mod reconciler;
mod rrset;
mod zone;

#[cfg(test)]
pub(crate) mod fake;
