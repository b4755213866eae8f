use agora_types::api::ReactionTargetView;
use agora_types::models::{Comment, Post, Reaction, ReactionKind, TargetKind};

use crate::error::{PostError, PostResult};
use crate::validate::reaction_kind;

/// Anything that carries like/dislike counters.
pub trait Reactable {
    fn id(&self) -> &str;
    fn like_count_mut(&mut self) -> &mut u32;
    fn dislike_count_mut(&mut self) -> &mut u32;
}

impl Reactable for Post {
    fn id(&self) -> &str {
        &self.id
    }

    fn like_count_mut(&mut self) -> &mut u32 {
        &mut self.like_count
    }

    fn dislike_count_mut(&mut self) -> &mut u32 {
        &mut self.dislike_count
    }
}

impl Reactable for Comment {
    fn id(&self) -> &str {
        &self.id
    }

    fn like_count_mut(&mut self) -> &mut u32 {
        &mut self.like_count
    }

    fn dislike_count_mut(&mut self) -> &mut u32 {
        &mut self.dislike_count
    }
}

/// A post or comment that a reaction lands on, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionTarget {
    Post(Post),
    Comment(Comment),
}

impl ReactionTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Post(_) => TargetKind::Post,
            Self::Comment(_) => TargetKind::Comment,
        }
    }

    pub fn like_count(&self) -> u32 {
        match self {
            Self::Post(p) => p.like_count,
            Self::Comment(c) => c.like_count,
        }
    }

    pub fn dislike_count(&self) -> u32 {
        match self {
            Self::Post(p) => p.dislike_count,
            Self::Comment(c) => c.dislike_count,
        }
    }

    pub fn view(&self) -> ReactionTargetView {
        ReactionTargetView {
            id: self.id().to_string(),
            kind: self.kind(),
            like_count: self.like_count(),
            dislike_count: self.dislike_count(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Reactable {
        match self {
            Self::Post(p) => p as &mut dyn Reactable,
            Self::Comment(c) => c as &mut dyn Reactable,
        }
    }
}

impl Reactable for ReactionTarget {
    fn id(&self) -> &str {
        match self {
            Self::Post(p) => &p.id,
            Self::Comment(c) => &c.id,
        }
    }

    fn like_count_mut(&mut self) -> &mut u32 {
        self.inner_mut().like_count_mut()
    }

    fn dislike_count_mut(&mut self) -> &mut u32 {
        self.inner_mut().dislike_count_mut()
    }
}

/// Picks the target out of a post lookup and a comment lookup for the same id.
/// Ids are unique across both tables, so both resolving means the store is
/// inconsistent.
pub fn resolve_target(
    target_id: &str,
    post: Option<Post>,
    comment: Option<Comment>,
) -> PostResult<ReactionTarget> {
    match (post, comment) {
        (Some(post), None) => Ok(ReactionTarget::Post(post)),
        (None, Some(comment)) => Ok(ReactionTarget::Comment(comment)),
        (None, None) => Err(PostError::not_found(format!("post or comment '{}'", target_id))),
        (Some(_), Some(_)) => Err(PostError::integrity(format!(
            "id '{}' resolves to both a post and a comment",
            target_id
        ))),
    }
}

/// Adds one vote to `target`, returning the updated target and the record
/// to persist. A user gets one vote per target; there is no way to change it.
pub fn apply_reaction(
    mut target: ReactionTarget,
    existing: Option<&Reaction>,
    user_id: &str,
    value: i64,
) -> PostResult<(ReactionTarget, Reaction)> {
    let kind = reaction_kind(value)?;

    if existing.is_some() {
        return Err(PostError::DuplicateReaction);
    }

    bump(&mut target, kind);

    let reaction = Reaction {
        user_id: user_id.to_string(),
        target_id: target.id().to_string(),
        target_kind: target.kind(),
        kind,
    };

    Ok((target, reaction))
}

fn bump<T: Reactable + ?Sized>(target: &mut T, kind: ReactionKind) {
    let counter = match kind {
        ReactionKind::Like => target.like_count_mut(),
        ReactionKind::Dislike => target.dislike_count_mut(),
    };
    *counter = counter.saturating_add(1);
}

/// Result of a successful `react` call.
#[derive(Debug, Clone)]
pub struct ReactionOutcome {
    pub reaction: Reaction,
    pub target: ReactionTarget,
}

impl ReactionOutcome {
    pub fn message(&self) -> &'static str {
        match self.reaction.kind {
            ReactionKind::Like => "'Like' registered",
            ReactionKind::Dislike => "'Dislike' registered",
        }
    }
}
