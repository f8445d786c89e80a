//! [`SqliteStore`] — the SQLite implementation of [`BillStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hansard_core::{
  amendment::{Amendment, AmendmentSponsor, AmendmentWithSponsors},
  bill::{Bill, BillStage, BillStageSitting},
  member::Member,
  session::Session,
  store::{BillPage, BillQuery, BillStore, DatasetCounts},
  synclog::{SyncLog, SyncType},
};

use crate::{
  Error, Result,
  encode::{
    RawAmendment, RawBill, RawMember, RawSession, RawSitting, RawStage,
    RawSyncLog, encode_date, encode_decision, encode_dt, encode_house,
    encode_stats, encode_sync_status, encode_sync_type, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hansard bill store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── BillStore impl ──────────────────────────────────────────────────────────

impl BillStore for SqliteStore {
  type Error = Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn upsert_session(&self, session: Session) -> Result<()> {
    let start_str = encode_date(session.start_date);
    let end_str   = session.end_date.map(encode_date);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (session_id, name, start_date, end_date, is_current)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(session_id) DO UPDATE SET
             name       = excluded.name,
             start_date = excluded.start_date,
             end_date   = excluded.end_date,
             is_current = excluded.is_current",
          rusqlite::params![
            session.session_id,
            session.name,
            start_str,
            end_str,
            session.is_current,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_sessions(&self) -> Result<Vec<Session>> {
    let raws: Vec<RawSession> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT session_id, name, start_date, end_date, is_current
           FROM sessions ORDER BY session_id DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSession {
              session_id: row.get(0)?,
              name:       row.get(1)?,
              start_date: row.get(2)?,
              end_date:   row.get(3)?,
              is_current: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSession::into_session).collect()
  }

  // ── Bills ─────────────────────────────────────────────────────────────────

  async fn upsert_bill(&self, bill: Bill) -> Result<()> {
    let originating_str = encode_house(bill.originating_house);
    let current_str     = encode_house(bill.current_house);
    let update_str      = encode_dt(bill.last_update);

    self
      .conn
      .call(move |conn| {
        // MAX() keeps the stored session id when the incoming one is
        // older; a carry-over bill never regresses to an earlier session.
        conn.execute(
          "INSERT INTO bills (
             bill_id, short_title, long_title, session_id,
             introduced_session_id, originating_house, current_house,
             is_withdrawn, is_defeated, is_act, last_update
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
           ON CONFLICT(bill_id) DO UPDATE SET
             short_title           = excluded.short_title,
             long_title            = excluded.long_title,
             session_id            = MAX(bills.session_id, excluded.session_id),
             introduced_session_id = excluded.introduced_session_id,
             originating_house     = excluded.originating_house,
             current_house         = excluded.current_house,
             is_withdrawn          = excluded.is_withdrawn,
             is_defeated           = excluded.is_defeated,
             is_act                = excluded.is_act,
             last_update           = excluded.last_update",
          rusqlite::params![
            bill.bill_id,
            bill.short_title,
            bill.long_title,
            bill.session_id,
            bill.introduced_session_id,
            originating_str,
            current_str,
            bill.is_withdrawn,
            bill.is_defeated,
            bill.is_act,
            update_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_bill(&self, bill_id: i64) -> Result<Option<Bill>> {
    let raw: Option<RawBill> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT bill_id, short_title, long_title, session_id,
                    introduced_session_id, originating_house, current_house,
                    is_withdrawn, is_defeated, is_act, last_update
             FROM bills WHERE bill_id = ?1",
            rusqlite::params![bill_id],
            bill_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBill::into_bill).transpose()
  }

  async fn list_bills(&self, query: &BillQuery) -> Result<BillPage> {
    let session_val  = query.session;
    let house_str    = query.house.map(encode_house);
    let text_pattern = query.text.as_deref().map(|t| format!("%{t}%"));
    let active       = query.active;
    let limit_val    = query.limit.unwrap_or(50) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let (raws, total): (Vec<RawBill>, u64) = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&'static str> = vec![];
        if session_val.is_some() {
          conds.push("session_id = ?1");
        }
        if house_str.is_some() {
          conds.push("current_house = ?2");
        }
        if text_pattern.is_some() {
          conds.push("(short_title LIKE ?3 OR long_title LIKE ?3)");
        }
        match active {
          Some(true) => {
            conds.push("is_withdrawn = 0 AND is_defeated = 0 AND is_act = 0");
          }
          Some(false) => {
            conds.push("(is_withdrawn = 1 OR is_defeated = 1 OR is_act = 1)");
          }
          None => {}
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT bill_id, short_title, long_title, session_id,
                  introduced_session_id, originating_house, current_house,
                  is_withdrawn, is_defeated, is_act, last_update,
                  COUNT(*) OVER () AS total
           FROM bills
           {where_clause}
           ORDER BY last_update DESC
           LIMIT ?4 OFFSET ?5"
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut total = 0u64;
        let mut raws = Vec::new();
        let mut rows = stmt.query(rusqlite::params![
          session_val,
          house_str.as_deref(),
          text_pattern.as_deref(),
          limit_val,
          offset_val,
        ])?;
        while let Some(row) = rows.next()? {
          total = row.get::<_, i64>(11)? as u64;
          raws.push(bill_from_row(row)?);
        }

        Ok((raws, total))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawBill::into_bill)
      .collect::<Result<Vec<_>>>()?;

    Ok(BillPage { items, total })
  }

  // ── Stages and sittings ───────────────────────────────────────────────────

  async fn upsert_stage(&self, stage: BillStage) -> Result<()> {
    let house_str = encode_house(stage.house);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO bill_stages (
             stage_id, bill_id, stage_type_id, description, house, sort_order
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(stage_id) DO UPDATE SET
             bill_id       = excluded.bill_id,
             stage_type_id = excluded.stage_type_id,
             description   = excluded.description,
             house         = excluded.house,
             sort_order    = excluded.sort_order",
          rusqlite::params![
            stage.stage_id,
            stage.bill_id,
            stage.stage_type_id,
            stage.description,
            house_str,
            stage.sort_order,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn stages_for_bill(&self, bill_id: i64) -> Result<Vec<BillStage>> {
    let raws: Vec<RawStage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT stage_id, bill_id, stage_type_id, description, house, sort_order
           FROM bill_stages WHERE bill_id = ?1 ORDER BY sort_order",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![bill_id], |row| {
            Ok(RawStage {
              stage_id:      row.get(0)?,
              bill_id:       row.get(1)?,
              stage_type_id: row.get(2)?,
              description:   row.get(3)?,
              house:         row.get(4)?,
              sort_order:    row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStage::into_stage).collect()
  }

  async fn upsert_sitting(&self, sitting: BillStageSitting) -> Result<()> {
    let date_str = sitting.date.map(encode_date);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO stage_sittings (sitting_id, stage_id, bill_id, date)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(sitting_id) DO UPDATE SET
             stage_id = excluded.stage_id,
             bill_id  = excluded.bill_id,
             date     = excluded.date",
          rusqlite::params![
            sitting.sitting_id,
            sitting.stage_id,
            sitting.bill_id,
            date_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn sittings_for_stage(&self, stage_id: i64) -> Result<Vec<BillStageSitting>> {
    let raws: Vec<RawSitting> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT sitting_id, stage_id, bill_id, date
           FROM stage_sittings WHERE stage_id = ?1 ORDER BY date",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![stage_id], |row| {
            Ok(RawSitting {
              sitting_id: row.get(0)?,
              stage_id:   row.get(1)?,
              bill_id:    row.get(2)?,
              date:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSitting::into_sitting).collect()
  }

  // ── Amendments ────────────────────────────────────────────────────────────

  async fn upsert_amendment(&self, amendment: Amendment) -> Result<()> {
    let decision_str = encode_decision(amendment.decision);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO amendments (
             amendment_id, stage_id, number, line, amendment_type,
             decision, decision_explanation, summary, marshalled_list_text, d_num
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
           ON CONFLICT(amendment_id) DO UPDATE SET
             stage_id             = excluded.stage_id,
             number               = excluded.number,
             line                 = excluded.line,
             amendment_type       = excluded.amendment_type,
             decision             = excluded.decision,
             decision_explanation = excluded.decision_explanation,
             summary              = excluded.summary,
             marshalled_list_text = excluded.marshalled_list_text,
             d_num                = excluded.d_num",
          rusqlite::params![
            amendment.amendment_id,
            amendment.stage_id,
            amendment.number,
            amendment.line,
            amendment.amendment_type,
            decision_str,
            amendment.decision_explanation,
            amendment.summary,
            amendment.marshalled_list_text,
            amendment.d_num,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn replace_sponsors(
    &self,
    amendment_id: i64,
    sponsors: Vec<AmendmentSponsor>,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM amendment_sponsors WHERE amendment_id = ?1",
          rusqlite::params![amendment_id],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO amendment_sponsors (amendment_id, member_id, is_lead, sort_order)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for sponsor in &sponsors {
            stmt.execute(rusqlite::params![
              amendment_id,
              sponsor.member_id,
              sponsor.is_lead,
              sponsor.sort_order,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn amendments_for_stage(
    &self,
    stage_id: i64,
  ) -> Result<Vec<AmendmentWithSponsors>> {
    let rows: Vec<(RawAmendment, Vec<AmendmentSponsor>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT amendment_id, stage_id, number, line, amendment_type,
                  decision, decision_explanation, summary,
                  marshalled_list_text, d_num
           FROM amendments WHERE stage_id = ?1 ORDER BY amendment_id",
        )?;
        let raws = stmt
          .query_map(rusqlite::params![stage_id], |row| {
            Ok(RawAmendment {
              amendment_id:         row.get(0)?,
              stage_id:             row.get(1)?,
              number:               row.get(2)?,
              line:                 row.get(3)?,
              amendment_type:       row.get(4)?,
              decision:             row.get(5)?,
              decision_explanation: row.get(6)?,
              summary:              row.get(7)?,
              marshalled_list_text: row.get(8)?,
              d_num:                row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut sponsor_stmt = conn.prepare(
          "SELECT amendment_id, member_id, is_lead, sort_order
           FROM amendment_sponsors WHERE amendment_id = ?1 ORDER BY sort_order",
        )?;

        let mut out = Vec::with_capacity(raws.len());
        for raw in raws {
          let sponsors = sponsor_stmt
            .query_map(rusqlite::params![raw.amendment_id], |row| {
              Ok(AmendmentSponsor {
                amendment_id: row.get(0)?,
                member_id:    row.get(1)?,
                is_lead:      row.get(2)?,
                sort_order:   row.get(3)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          out.push((raw, sponsors));
        }

        Ok(out)
      })
      .await?;

    rows
      .into_iter()
      .map(|(raw, sponsors)| {
        Ok(AmendmentWithSponsors { amendment: raw.into_amendment()?, sponsors })
      })
      .collect()
  }

  // ── Members ───────────────────────────────────────────────────────────────

  async fn upsert_member_stub(&self, member: Member) -> Result<()> {
    let house_str = encode_house(member.house);

    self
      .conn
      .call(move |conn| {
        // Enrichment-only columns (display_name, party_colour) keep their
        // stored values when the row already exists.
        conn.execute(
          "INSERT INTO members (
             member_id, name, display_name, party, party_colour,
             house, member_from, thumbnail_url
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT(member_id) DO UPDATE SET
             name        = excluded.name,
             party       = excluded.party,
             house       = excluded.house,
             member_from = excluded.member_from",
          rusqlite::params![
            member.member_id,
            member.name,
            member.display_name,
            member.party,
            member.party_colour,
            house_str,
            member.member_from,
            member.thumbnail_url,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn upsert_member_full(&self, member: Member) -> Result<()> {
    let house_str = encode_house(member.house);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO members (
             member_id, name, display_name, party, party_colour,
             house, member_from, thumbnail_url
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT(member_id) DO UPDATE SET
             name          = excluded.name,
             display_name  = excluded.display_name,
             party         = excluded.party,
             party_colour  = excluded.party_colour,
             house         = excluded.house,
             member_from   = excluded.member_from,
             thumbnail_url = excluded.thumbnail_url",
          rusqlite::params![
            member.member_id,
            member.name,
            member.display_name,
            member.party,
            member.party_colour,
            house_str,
            member.member_from,
            member.thumbnail_url,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_member(&self, member_id: i64) -> Result<Option<Member>> {
    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT member_id, name, display_name, party, party_colour,
                    house, member_from, thumbnail_url
             FROM members WHERE member_id = ?1",
            rusqlite::params![member_id],
            |row| {
              Ok(RawMember {
                member_id:     row.get(0)?,
                name:          row.get(1)?,
                display_name:  row.get(2)?,
                party:         row.get(3)?,
                party_colour:  row.get(4)?,
                house:         row.get(5)?,
                member_from:   row.get(6)?,
                thumbnail_url: row.get(7)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMember::into_member).transpose()
  }

  // ── Sync log ──────────────────────────────────────────────────────────────

  async fn insert_sync_log(&self, log: SyncLog) -> Result<()> {
    let id_str      = encode_uuid(log.sync_log_id);
    let type_str    = encode_sync_type(log.sync_type);
    let status_str  = encode_sync_status(log.status);
    let started_str = encode_dt(log.started_at);
    let done_str    = log.completed_at.map(encode_dt);
    let stats_str   = log.stats.as_ref().map(encode_stats).transpose()?;
    let error       = log.error;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sync_logs (
             sync_log_id, sync_type, status, started_at, completed_at, error, stats
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, type_str, status_str, started_str, done_str, error, stats_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn finish_sync_log(&self, log: SyncLog) -> Result<()> {
    let id_str     = encode_uuid(log.sync_log_id);
    let status_str = encode_sync_status(log.status);
    let done_str   = log.completed_at.map(encode_dt);
    let stats_str  = log.stats.as_ref().map(encode_stats).transpose()?;
    let error      = log.error;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE sync_logs
           SET status = ?2, completed_at = ?3, error = ?4, stats = ?5
           WHERE sync_log_id = ?1",
          rusqlite::params![id_str, status_str, done_str, error, stats_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_sync_log(&self, sync_log_id: Uuid) -> Result<Option<SyncLog>> {
    let id_str = encode_uuid(sync_log_id);

    let raw: Option<RawSyncLog> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT sync_log_id, sync_type, status, started_at,
                    completed_at, error, stats
             FROM sync_logs WHERE sync_log_id = ?1",
            rusqlite::params![id_str],
            sync_log_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSyncLog::into_sync_log).transpose()
  }

  async fn running_sync(&self) -> Result<Option<SyncLog>> {
    let raw: Option<RawSyncLog> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT sync_log_id, sync_type, status, started_at,
                    completed_at, error, stats
             FROM sync_logs WHERE status = 'running'
             ORDER BY started_at DESC LIMIT 1",
            [],
            sync_log_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSyncLog::into_sync_log).transpose()
  }

  async fn latest_completed_sync(
    &self,
    sync_type: SyncType,
  ) -> Result<Option<SyncLog>> {
    let type_str = encode_sync_type(sync_type);

    let raw: Option<RawSyncLog> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT sync_log_id, sync_type, status, started_at,
                    completed_at, error, stats
             FROM sync_logs
             WHERE status = 'completed' AND sync_type = ?1
             ORDER BY completed_at DESC LIMIT 1",
            rusqlite::params![type_str],
            sync_log_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSyncLog::into_sync_log).transpose()
  }

  async fn latest_sync_log(&self) -> Result<Option<SyncLog>> {
    let raw: Option<RawSyncLog> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT sync_log_id, sync_type, status, started_at,
                    completed_at, error, stats
             FROM sync_logs ORDER BY started_at DESC LIMIT 1",
            [],
            sync_log_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSyncLog::into_sync_log).transpose()
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn dataset_counts(&self) -> Result<DatasetCounts> {
    let counts = self
      .conn
      .call(|conn| {
        let bills: i64 =
          conn.query_row("SELECT COUNT(*) FROM bills", [], |r| r.get(0))?;
        let amendments: i64 =
          conn.query_row("SELECT COUNT(*) FROM amendments", [], |r| r.get(0))?;
        let members: i64 =
          conn.query_row("SELECT COUNT(*) FROM members", [], |r| r.get(0))?;
        Ok(DatasetCounts {
          bills:      bills as u64,
          amendments: amendments as u64,
          members:    members as u64,
        })
      })
      .await?;
    Ok(counts)
  }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn bill_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawBill> {
  Ok(RawBill {
    bill_id:               row.get(0)?,
    short_title:           row.get(1)?,
    long_title:            row.get(2)?,
    session_id:            row.get(3)?,
    introduced_session_id: row.get(4)?,
    originating_house:     row.get(5)?,
    current_house:         row.get(6)?,
    is_withdrawn:          row.get(7)?,
    is_defeated:           row.get(8)?,
    is_act:                row.get(9)?,
    last_update:           row.get(10)?,
  })
}

fn sync_log_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSyncLog> {
  Ok(RawSyncLog {
    sync_log_id:  row.get(0)?,
    sync_type:    row.get(1)?,
    status:       row.get(2)?,
    started_at:   row.get(3)?,
    completed_at: row.get(4)?,
    error:        row.get(5)?,
    stats:        row.get(6)?,
  })
}
