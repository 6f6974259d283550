/*!

This is the long-form manual for `collegiate_voting` and `colvote`.

## How a round is decided

1. Every `FOLLOWS` ballot of a rapporteur or reviewer is replaced by the position
   of the voter it follows, transitively. A follow may only point to another
   rapporteur or reviewer of the same round. Loops (including a voter following
   themselves) and follows to unknown names stop the evaluation with an error.
2. The substantive positions (`APPROVED`, `DENIED`, `PARTIAL`) of the
   rapporteurs, reviewers and council members are counted. Council members who
   abstain, are absent or barred are counted apart and never influence the
   decision.
3. The position with the most votes wins. If the two highest counts are equal,
   including a tie between all three positions, the presiding voter must cast a
   ballot for one of the tied positions. That ballot is added to the count.

A round with missing ballots, or with a tie and no presiding ballot, is not an
error: `colvote` reports it with the status `incompleteRoster` or
`unresolvedTie` and the names of the voters or the tied positions.

## Labels

| position   | aliases      |
|------------|--------------|
| `APPROVED` | `PROVIDO`    |
| `DENIED`   | `NEGADO`     |
| `PARTIAL`  | `PARCIAL`    |
| `FOLLOWS`  | `ACOMPANHA`  |
| `ABSTAIN`  | `ABSTENCAO`  |
| `ABSENT`   | `AUSENTE`    |
| `BARRED`   | `IMPEDIDO`   |

Roles are `RAPPORTEUR` (`RELATOR`), `REVIEWER` (`REVISOR`) and
`COUNCIL_MEMBER` (`CONSELHEIRO`). Labels are case insensitive.

## Session file

`colvote` reads a JSON description of the round with the `--config` flag:

```text
{
  "session": { "caseNumber": "10980.720", "sessionDate": "2024-03-12", "chamber": "2nd chamber", "round": 1 },
  "roster": [
    { "name": "Ana", "role": "RAPPORTEUR" },
    { "name": "Rui", "role": "REVIEWER" },
    { "id": "c1", "name": "Bruno", "role": "COUNCIL_MEMBER" },
    { "id": "c2", "name": "Carla", "role": "COUNCIL_MEMBER", "promotedToReviewer": true }
  ],
  "presiding": { "id": "p1", "name": "Paulo" },
  "ballots": [
    { "voter": "Ana", "position": "APPROVED" },
    { "voter": "Rui", "position": "FOLLOWS", "follows": "Ana" }
  ],
  "ballotSources": [ { "provider": "csv", "filePath": "ballots.csv" } ],
  "tieBreak": "DENIED"
}
```

- `roster` is the closed list of voters. Names must be unique, as must the
  identifiers when provided.
- `promotedToReviewer` seats a council member with the reviewers for this round.
  The round needs at least one rapporteur or reviewer once the promotions are
  applied: a promoted council member is enough.
- `ballots` and `ballotSources` are both optional and are combined. File paths
  are relative to the directory of the session file.
- `tieBreak` is the ballot of the presiding voter. It is only used when the
  members are tied.

## Ballot sheets

### `csv`

```text
name,position,follows
Ana,APPROVED,
Rui,FOLLOWS,Ana
Bruno,ABSTAIN,
```

The first row is skipped by default. A ballot source accepts the following
options (column and row indices start at 1):
- `firstVoteRowIndex` (default 2): the first row holding a ballot
- `nameColumnIndex` (default 1), `positionColumnIndex` (default 2),
  `followsColumnIndex` (default 3)

### `xlsx`

The same layout in an Excel worksheet. `excelWorksheetName` selects the
worksheet. It is required when the workbook has more than one.

## Output

The summary is written in JSON, to the path given with `--out` (or `stdout`).
If `--reference` is given, the summary is compared with the reference file and
any difference is printed and reported as an error.

 */
