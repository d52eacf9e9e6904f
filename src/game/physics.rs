//! Ball physics: serving, integration, collisions and scoring

use std::f32::consts::FRAC_PI_4;

use rand::Rng;

use super::session::{Ball, GameSession, Paddle, Role};
use super::{PlayerId, GAME_HEIGHT, GAME_WIDTH, INITIAL_BALL_SPEED, MAX_SCORE};

/// Result of advancing one session by a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Ball still in play
    Rally,
    /// A point was scored and the ball re-served
    Scored { scorer: PlayerId },
    /// A point was scored that reached `MAX_SCORE`
    Won { winner: PlayerId },
}

/// Reset the ball to the center and serve it.
///
/// The vertical direction points at `scored_on` when given (toward the
/// player who just conceded), otherwise it is a coin flip. The horizontal
/// direction is always a coin flip.
pub fn serve(session: &mut GameSession, scored_on: Option<PlayerId>) {
    let toward = scored_on.and_then(|id| session.role_of(&id));
    let rng = &mut session.rng;

    let angle = rng.gen_range(-FRAC_PI_4..=FRAC_PI_4);
    let dx = INITIAL_BALL_SPEED * angle.sin();
    let dy = INITIAL_BALL_SPEED * angle.cos();

    // y grows downward, so positive dy travels toward the bottom defender
    let dy = match toward {
        Some(Role::Bottom) => dy.abs(),
        Some(Role::Top) => -dy.abs(),
        None if rng.gen_bool(0.5) => dy,
        None => -dy,
    };
    let dx = if rng.gen_bool(0.5) { dx } else { -dx };

    let ball = &mut session.state.ball;
    ball.x = GAME_WIDTH / 2.0;
    ball.y = GAME_HEIGHT / 2.0;
    ball.dx = dx;
    ball.dy = dy;
}

/// Advance the session by one tick.
///
/// Goal detection runs first; a goal skips wall and paddle resolution for
/// the rest of the tick.
pub fn step(session: &mut GameSession) -> StepOutcome {
    let ball = &mut session.state.ball;
    ball.x += ball.dx;
    ball.y += ball.dy;

    if let Some(outcome) = check_goal(session) {
        return outcome;
    }

    bounce_off_side_walls(&mut session.state.ball);

    let [bottom, top] = &session.state.paddles;
    let ball = &mut session.state.ball;
    if !deflect_off_bottom_paddle(ball, bottom) {
        deflect_off_top_paddle(ball, top);
    }

    StepOutcome::Rally
}

fn check_goal(session: &mut GameSession) -> Option<StepOutcome> {
    let ball = &session.state.ball;

    let (scorer, scored_on) = if ball.y - ball.radius < 0.0 && ball.dy < 0.0 {
        (session.bottom_player_id, session.top_player_id)
    } else if ball.y + ball.radius > GAME_HEIGHT && ball.dy > 0.0 {
        (session.top_player_id, session.bottom_player_id)
    } else {
        return None;
    };

    let points = session.state.score.entry(scorer).or_insert(0);
    *points += 1;
    let reached_max = *points >= MAX_SCORE;

    serve(session, Some(scored_on));

    if reached_max {
        Some(StepOutcome::Won { winner: scorer })
    } else {
        Some(StepOutcome::Scored { scorer })
    }
}

fn bounce_off_side_walls(ball: &mut Ball) {
    let past_left = ball.x - ball.radius < 0.0 && ball.dx < 0.0;
    let past_right = ball.x + ball.radius > GAME_WIDTH && ball.dx > 0.0;

    if past_left || past_right {
        ball.dx = -ball.dx;
        ball.x = ball.x.clamp(ball.radius, GAME_WIDTH - ball.radius);
    }
}

fn overlaps(ball: &Ball, paddle: &Paddle) -> bool {
    ball.x + ball.radius >= paddle.left()
        && ball.x - ball.radius <= paddle.right()
        && ball.y + ball.radius >= paddle.top()
        && ball.y - ball.radius <= paddle.bottom()
}

fn deflect_off_bottom_paddle(ball: &mut Ball, paddle: &Paddle) -> bool {
    if ball.dy > 0.0 && overlaps(ball, paddle) {
        ball.dy = -ball.dy;
        ball.y = paddle.top() - ball.radius;
        true
    } else {
        false
    }
}

fn deflect_off_top_paddle(ball: &mut Ball, paddle: &Paddle) -> bool {
    if ball.dy < 0.0 && overlaps(ball, paddle) {
        ball.dy = -ball.dy;
        ball.y = paddle.bottom() + ball.radius;
        true
    } else {
        false
    }
}
